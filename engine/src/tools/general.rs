//! General knowledge tool
//!
//! Forwards the question straight to the completion service, without the
//! retrieval context. Useful when the model decides the answer is common
//! knowledge rather than something in the personal index.

use super::ToolInput;
use sdk::services::CompletionService;
use std::sync::Arc;

pub struct GeneralKnowledgeTool {
    completion: Arc<dyn CompletionService>,
}

impl GeneralKnowledgeTool {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn invoke(&self, input: &ToolInput) -> String {
        let Some(question) = input.free_text() else {
            return "General knowledge error: expected a question".to_string();
        };
        match self.completion.generate(question, None).await {
            Ok(answer) => answer,
            Err(e) => format!("General knowledge error: {}", e),
        }
    }
}
