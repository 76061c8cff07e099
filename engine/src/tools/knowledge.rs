//! Personal knowledge tool
//!
//! Does not fetch anything itself: the retrieval context is already in
//! the system prompt, so this tool's result just steers the model back to
//! that context for questions about people and private events.

use super::ToolInput;

pub struct PersonalKnowledgeTool;

impl PersonalKnowledgeTool {
    pub fn invoke(&self, input: &ToolInput) -> String {
        let Some(query) = input.free_text() else {
            return "Personal knowledge query error: expected a query".to_string();
        };
        format!(
            "Personal knowledge query: {} - answer from the retrieved knowledge \
             already provided in the context above.",
            query
        )
    }
}
