//! Built-in tools and their registry
//!
//! The registry is an immutable collection of tagged tool variants,
//! composed once at construction. Dispatch is by name; argument
//! extraction is positional-by-convention: a structured file-operation
//! shape wins, then the first matching free-text key in priority order,
//! and anything else is stringified and passed through.
//!
//! Tool output is always a string. Failures inside a tool become
//! error-marked result strings so the model can see them and
//! self-correct; nothing a tool does can abort the query.

pub mod calculator;
pub mod clock;
pub mod file_ops;
pub mod general;
pub mod knowledge;
pub mod url_fetch;
pub mod weather;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use file_ops::FileOpsTool;
pub use general::GeneralKnowledgeTool;
pub use knowledge::PersonalKnowledgeTool;
pub use url_fetch::UrlFetchTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

use crate::config::ToolsConfig;
use sdk::services::CompletionService;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Free-text argument keys, highest priority first.
const FREE_TEXT_KEYS: [&str; 8] = [
    "query",
    "question",
    "expression",
    "location",
    "url",
    "timezone",
    "text",
    "input",
];

/// Extracted tool arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    /// A single free-text argument
    Text(String),

    /// Structured file-operation arguments
    FileOp {
        operation: String,
        filename: Option<String>,
        content: Option<String>,
    },

    /// No recognized shape; raw arguments stringified
    Raw(String),
}

impl ToolInput {
    /// The free-text payload, if any. Raw arguments pass through as text.
    pub fn free_text(&self) -> Option<&str> {
        match self {
            ToolInput::Text(s) | ToolInput::Raw(s) => Some(s),
            ToolInput::FileOp { .. } => None,
        }
    }
}

/// Map an arguments value onto a [`ToolInput`] by convention.
pub fn extract_input(arguments: &Value) -> ToolInput {
    if let Some(obj) = arguments.as_object() {
        if let Some(operation) = obj.get("operation").and_then(Value::as_str) {
            return ToolInput::FileOp {
                operation: operation.to_string(),
                filename: obj
                    .get("filename")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                content: obj
                    .get("content")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
        }
        for key in FREE_TEXT_KEYS {
            if let Some(text) = obj.get(key).and_then(Value::as_str) {
                return ToolInput::Text(text.to_string());
            }
        }
    } else if let Some(text) = arguments.as_str() {
        return ToolInput::Text(text.to_string());
    }
    ToolInput::Raw(arguments.to_string())
}

/// The closed set of tool implementations.
enum ToolKind {
    Calculator(CalculatorTool),
    Clock(ClockTool),
    General(GeneralKnowledgeTool),
    Knowledge(PersonalKnowledgeTool),
    WebSearch(WebSearchTool),
    Weather(WeatherTool),
    UrlFetch(UrlFetchTool),
    FileOps(FileOpsTool),
}

/// A named tool: descriptor plus implementation.
pub struct Tool {
    name: &'static str,
    description: &'static str,
    parameters: Value,
    kind: ToolKind,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn calculator() -> Self {
        Self {
            name: "calculator",
            description: "Perform mathematical calculations",
            parameters: json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "Mathematical expression to evaluate"
                    }
                },
                "required": ["expression"]
            }),
            kind: ToolKind::Calculator(CalculatorTool),
        }
    }

    pub fn clock() -> Self {
        Self {
            name: "get_time",
            description: "Get current time and date information",
            parameters: json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": "Timezone (optional, defaults to UTC)",
                        "default": "UTC"
                    }
                },
                "required": []
            }),
            kind: ToolKind::Clock(ClockTool),
        }
    }

    pub fn general_knowledge(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            name: "general_knowledge",
            description: "Answer general questions using AI knowledge",
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question to answer"
                    }
                },
                "required": ["question"]
            }),
            kind: ToolKind::General(GeneralKnowledgeTool::new(completion)),
        }
    }

    pub fn personal_knowledge() -> Self {
        Self {
            name: "personal_knowledge",
            description: "Access the personal knowledge base for information about \
                          acquaintances, friends, family members, or private events that \
                          aren't widely known. Use this for specific names or events that \
                          aren't public figures or major historical events.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Question about a specific person or private event"
                    }
                },
                "required": ["query"]
            }),
            kind: ToolKind::Knowledge(PersonalKnowledgeTool),
        }
    }

    pub fn web_search(endpoint: impl Into<String>) -> Self {
        Self {
            name: "web_search",
            description: "Search the web for current information and news",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
            kind: ToolKind::WebSearch(WebSearchTool::new(endpoint)),
        }
    }

    pub fn weather(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            name: "get_weather",
            description: "Get current weather information for a location",
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "City name or location"
                    }
                },
                "required": ["location"]
            }),
            kind: ToolKind::Weather(WeatherTool::new(endpoint, api_key)),
        }
    }

    pub fn url_fetch() -> Self {
        Self {
            name: "fetch_url_content",
            description: "Fetch and summarize content from a URL",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL to fetch content from"
                    }
                },
                "required": ["url"]
            }),
            kind: ToolKind::UrlFetch(UrlFetchTool::new()),
        }
    }

    pub fn file_operations(workspace: PathBuf) -> Self {
        Self {
            name: "file_operations",
            description: "Read, write, or list files in the workspace directory",
            parameters: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "description": "Operation: 'read', 'write', 'list'",
                        "enum": ["read", "write", "list"]
                    },
                    "filename": {
                        "type": "string",
                        "description": "Name of the file"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write (for write operation)"
                    }
                },
                "required": ["operation"]
            }),
            kind: ToolKind::FileOps(FileOpsTool::new(workspace)),
        }
    }
}

/// Registry of the tools available to one engine instance.
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Create an empty registry with no tools enabled.
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Compose a registry from an explicit tool list.
    pub fn with_tools(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    /// Compose the configured tool set. This is the only registration
    /// point; the registry is immutable afterwards.
    pub fn from_config(
        config: &ToolsConfig,
        workspace: PathBuf,
        completion: Arc<dyn CompletionService>,
        weather_api_key: Option<String>,
    ) -> Self {
        let mut tools = Vec::new();
        if config.calculator {
            tools.push(Tool::calculator());
        }
        if config.clock {
            tools.push(Tool::clock());
        }
        if config.general_knowledge {
            tools.push(Tool::general_knowledge(completion));
        }
        if config.personal_knowledge {
            tools.push(Tool::personal_knowledge());
        }
        if config.web_search {
            tools.push(Tool::web_search(config.web_search_endpoint.clone()));
        }
        if config.weather {
            tools.push(Tool::weather(
                config.weather_endpoint.clone(),
                weather_api_key,
            ));
        }
        if config.url_fetch {
            tools.push(Tool::url_fetch());
        }
        if config.file_operations {
            tools.push(Tool::file_operations(workspace));
        }
        Self { tools }
    }

    /// Execute a tool by name.
    ///
    /// An unknown name returns a descriptive "not found" string rather
    /// than an error: the orchestrator feeds it back to the model as
    /// ordinary tool output.
    pub async fn execute(&self, name: &str, arguments: &Value) -> String {
        debug!("Dispatching tool '{}' with args: {}", name, arguments);

        let Some(tool) = self.tools.iter().find(|t| t.name == name) else {
            warn!("Unknown tool requested: {}", name);
            return format!(
                "Tool '{}' not found. Available tools: {}",
                name,
                self.names().join(", ")
            );
        };

        let input = extract_input(arguments);
        match &tool.kind {
            ToolKind::Calculator(t) => t.invoke(&input),
            ToolKind::Clock(t) => t.invoke(&input),
            ToolKind::General(t) => t.invoke(&input).await,
            ToolKind::Knowledge(t) => t.invoke(&input),
            ToolKind::WebSearch(t) => t.invoke(&input).await,
            ToolKind::Weather(t) => t.invoke(&input).await,
            ToolKind::UrlFetch(t) => t.invoke(&input).await,
            ToolKind::FileOps(t) => t.invoke(&input).await,
        }
    }

    /// Model-facing listing of every registered tool and its schema.
    pub fn schema_listing(&self) -> String {
        self.tools
            .iter()
            .map(|t| {
                format!(
                    "## {}\n{}\nArguments schema: {}",
                    t.name, t.description, t.parameters
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
