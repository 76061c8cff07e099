//! Top-level query orchestration
//!
//! Composes the conversation store, relevance filter, and tool loop into
//! the single operation the engine exposes: answer a question, optionally
//! inside an existing session. All steps are sequential; the retrieval
//! fetch and the completion calls are the suspension points, and neither
//! holds the store lock.

use crate::agent::{AnswerMethod, ToolLoop};
use crate::conversation::{ContextStats, ConversationStore, Sender};
use crate::relevance::RelevanceFilter;
use sdk::services::Retriever;
use sdk::types::ScoredDocument;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Substituted for the knowledge section when retrieval produced nothing
/// usable, so the prompt never carries an empty section.
pub const NO_KNOWLEDGE_MARKER: &str = "No relevant knowledge found in the knowledge base.";

/// Orchestrator-level settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Candidates fetched from the retrieval service per query
    pub retrieval_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { retrieval_k: 5 }
    }
}

/// Structured diagnostics returned with every answer.
#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub session_id: String,
    pub context: ContextStats,
    pub documents_fetched: usize,
    pub documents_retained: usize,
    pub executed_tool_calls: usize,
    pub model_turns: usize,
    pub method: AnswerMethod,
}

/// The engine's single outward-facing result.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub session_id: String,
    pub diagnostics: Diagnostics,
}

/// Per-question composition of the core components.
pub struct QueryOrchestrator {
    store: ConversationStore,
    filter: RelevanceFilter,
    tool_loop: ToolLoop,
    retriever: Option<Arc<dyn Retriever>>,
    config: OrchestratorConfig,
}

impl QueryOrchestrator {
    pub fn new(
        store: ConversationStore,
        filter: RelevanceFilter,
        tool_loop: ToolLoop,
        retriever: Option<Arc<dyn Retriever>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            filter,
            tool_loop,
            retriever,
            config,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Answer a question, resolving or creating its session.
    ///
    /// Never fails: every failure along the pipeline degrades into an
    /// answer string, and the diagnostics say how the answer was made.
    pub async fn answer(&self, question: &str, session_id: Option<&str>) -> QueryResponse {
        let session_id = self.store.get_or_create_session(session_id);
        let (conversation, stats) = self
            .store
            .get_conversation_context(&session_id, question);

        let candidates = self.fetch_candidates(question).await;
        let retained = self.filter.filter(&candidates);

        let knowledge = if retained.is_empty() {
            NO_KNOWLEDGE_MARKER.to_string()
        } else {
            retained
                .iter()
                .map(|d| format!("- {}", d.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let conversation_block = if conversation.is_empty() {
            "(no prior conversation)".to_string()
        } else {
            conversation
        };

        let context = format!(
            "### Conversation so far\n{}\n\n### Retrieved knowledge\n{}",
            conversation_block, knowledge
        );

        let outcome = self.tool_loop.run(question, &context).await;

        self.store.add_message(&session_id, Sender::User, question);
        self.store
            .add_message(&session_id, Sender::Agent, &outcome.answer);

        info!(
            "Answered question in session {} via {:?} ({} tool calls, {} turns)",
            session_id, outcome.method, outcome.executed_calls, outcome.model_turns
        );

        QueryResponse {
            answer: outcome.answer,
            session_id: session_id.clone(),
            diagnostics: Diagnostics {
                session_id,
                context: stats,
                documents_fetched: candidates.len(),
                documents_retained: retained.len(),
                executed_tool_calls: outcome.executed_calls,
                model_turns: outcome.model_turns,
                method: outcome.method,
            },
        }
    }

    async fn fetch_candidates(&self, question: &str) -> Vec<ScoredDocument> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };
        match retriever.search(question, self.config.retrieval_k).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Retrieval failed, continuing without knowledge: {}", e);
                Vec::new()
            }
        }
    }
}
