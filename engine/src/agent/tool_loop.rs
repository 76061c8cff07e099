//! The bounded tool-call loop
//!
//! One query drives one loop. Each iteration asks the completion service
//! for a turn, tries to read a structured tool request out of the reply,
//! and either executes the tool (appending the result to the running
//! prompt) or treats the reply as the final answer. Two ceilings bound
//! the loop: `max_tool_calls` executed calls, and `2 * max_tool_calls + 1`
//! total model turns so a model stuck repeating the same tool cannot spin
//! on duplicate rejections forever.
//!
//! The loop always produces an answer. Completion failures fall back to
//! the best available partial evidence; they never propagate.

use super::prompts;
use crate::tools::ToolRegistry;
use sdk::services::CompletionService;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tool loop bounds.
#[derive(Debug, Clone)]
pub struct ToolLoopConfig {
    /// Maximum number of executed tool calls per query
    pub max_tool_calls: usize,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self { max_tool_calls: 5 }
    }
}

/// One executed tool call. Ephemeral; lives only for the duration of a
/// single query's loop.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub arguments: Value,
    pub result: String,
}

/// How the final answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMethod {
    /// The model answered without executing any tool
    Direct,

    /// At least one tool ran and the answer came from synthesis
    ToolLoop,

    /// A completion failure forced a locally assembled answer
    Fallback,
}

/// Everything a finished loop hands back to the orchestrator.
#[derive(Debug)]
pub struct LoopOutcome {
    pub answer: String,
    pub records: Vec<ToolCallRecord>,
    pub executed_calls: usize,
    pub model_turns: usize,
    pub method: AnswerMethod,
}

/// A structured tool request parsed out of a model response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolRequest {
    pub tool: String,
    pub arguments: Value,
}

/// Best-effort parse of a tool request: the substring between the first
/// `{` and the last `}`, read as a JSON object carrying `tool` and
/// `arguments`. Anything else means the response is a final answer.
pub(crate) fn parse_tool_request(response: &str) -> Option<ToolRequest> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = serde_json::from_str(&response[start..=end]).ok()?;
    let tool = value.get("tool")?.as_str()?.to_string();
    let arguments = value.get("arguments")?.clone();

    Some(ToolRequest { tool, arguments })
}

/// Locally assembled answer for when the completion service dies mid-query.
fn fallback_answer(context: &str, records: &[ToolCallRecord]) -> String {
    if !records.is_empty() {
        let mut parts = vec![
            "I could not finish reasoning about this question, but here is the \
             evidence I gathered:"
                .to_string(),
        ];
        for (i, record) in records.iter().enumerate() {
            parts.push(format!("{}. {}: {}", i + 1, record.tool_name, record.result));
        }
        return parts.join("\n");
    }

    if !context.trim().is_empty() {
        return format!(
            "I could not reach the language model. The most relevant context I \
             found:\n{}",
            context
        );
    }

    "I am sorry, I could not process this question right now. Please try again."
        .to_string()
}

/// The tool loop itself.
pub struct ToolLoop {
    completion: Arc<dyn CompletionService>,
    tools: Arc<ToolRegistry>,
    config: ToolLoopConfig,
}

impl ToolLoop {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        tools: Arc<ToolRegistry>,
        config: ToolLoopConfig,
    ) -> Self {
        Self {
            completion,
            tools,
            config,
        }
    }

    /// Run the loop for one question against the given context block.
    pub async fn run(&self, question: &str, context: &str) -> LoopOutcome {
        let mut prompt = prompts::build_system_prompt(&self.tools.schema_listing(), context);
        let mut records: Vec<ToolCallRecord> = Vec::new();
        let mut last_tool: Option<String> = None;
        let mut executed = 0usize;
        let mut turns = 0usize;

        let max_calls = self.config.max_tool_calls;
        let max_turns = 2 * max_calls + 1;

        let mut final_response: Option<String> = None;

        while executed < max_calls && turns < max_turns {
            turns += 1;

            let response = match self.completion.generate(question, Some(&prompt)).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Completion failed on turn {}: {}", turns, e);
                    let answer = fallback_answer(context, &records);
                    return LoopOutcome {
                        answer,
                        records,
                        executed_calls: executed,
                        model_turns: turns,
                        method: AnswerMethod::Fallback,
                    };
                }
            };

            let Some(request) = parse_tool_request(&response) else {
                final_response = Some(response);
                break;
            };

            if last_tool.as_deref() == Some(request.tool.as_str()) {
                debug!("Duplicate tool request rejected: {}", request.tool);
                prompt.push_str(&prompts::duplicate_warning(&request.tool));
                continue;
            }

            debug!("Executing tool {} (call {})", request.tool, executed + 1);
            let result = self.tools.execute(&request.tool, &request.arguments).await;
            prompt.push_str(&prompts::tool_exchange(
                &request.tool,
                &request.arguments,
                &result,
            ));
            records.push(ToolCallRecord {
                tool_name: request.tool.clone(),
                arguments: request.arguments,
                result,
            });
            last_tool = Some(request.tool);
            executed += 1;
        }

        if records.is_empty() {
            // No tool ever ran: the model's own text is the answer.
            let answer = match final_response {
                Some(text) => text,
                None => fallback_answer(context, &records),
            };
            return LoopOutcome {
                answer,
                records,
                executed_calls: executed,
                model_turns: turns,
                method: AnswerMethod::Direct,
            };
        }

        info!(
            "Synthesizing answer from {} tool calls over {} turns",
            executed, turns
        );
        let synthesis =
            prompts::build_synthesis_prompt(&prompt, final_response.as_deref(), &records);

        match self.completion.generate(question, Some(&synthesis)).await {
            Ok(answer) => LoopOutcome {
                answer,
                records,
                executed_calls: executed,
                model_turns: turns + 1,
                method: AnswerMethod::ToolLoop,
            },
            Err(e) => {
                warn!("Synthesis completion failed: {}", e);
                let answer = fallback_answer(context, &records);
                LoopOutcome {
                    answer,
                    records,
                    executed_calls: executed,
                    model_turns: turns + 1,
                    method: AnswerMethod::Fallback,
                }
            }
        }
    }
}
