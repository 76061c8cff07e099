//! End-to-end orchestrator tests against mock HTTP services
//!
//! Wires the real Gemini client and HTTP retriever at mock endpoints and
//! drives full queries through session resolution, retrieval, filtering,
//! the tool loop, and answer recording.

use sage_engine::agent::{AnswerMethod, ToolLoop, ToolLoopConfig};
use sage_engine::config::LlmConfig;
use sage_engine::conversation::{ConversationStore, StoreConfig};
use sage_engine::llm::GeminiClient;
use sage_engine::orchestrator::{
    OrchestratorConfig, QueryOrchestrator, NO_KNOWLEDGE_MARKER,
};
use sage_engine::relevance::RelevanceFilter;
use sage_engine::retrieval::HttpRetriever;
use sage_engine::tools::{Tool, ToolRegistry};
use sdk::services::{CompletionService, Retriever};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/models/gemini-1.5-pro:generateContent";

fn gemini_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            {"content": {"parts": [{"text": text}]}}
        ]
    })
}

fn gemini_client(mock_uri: &str) -> Arc<dyn CompletionService> {
    Arc::new(GeminiClient::new(
        LlmConfig {
            base_url: mock_uri.to_string(),
            model: "gemini-1.5-pro".to_string(),
            timeout_secs: 30,
        },
        "test-key",
    ))
}

fn orchestrator(
    completion: Arc<dyn CompletionService>,
    retriever: Option<Arc<dyn Retriever>>,
    tools: ToolRegistry,
) -> QueryOrchestrator {
    let tool_loop = ToolLoop::new(completion, Arc::new(tools), ToolLoopConfig::default());
    QueryOrchestrator::new(
        ConversationStore::new(StoreConfig::default()),
        RelevanceFilter::default(),
        tool_loop,
        retriever,
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn test_direct_answer_with_retrieval_context() {
    let mock_server = MockServer::start().await;

    // The retrieved knowledge must appear in the prompt sent to Gemini
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_string_contains("The capital of France is Paris"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_body("Paris is the capital of France.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"content": "The capital of France is Paris", "score": 0.3},
            {"content": "Bordeaux wine production statistics", "score": 2.8}
        ])))
        .mount(&mock_server)
        .await;

    let retriever: Arc<dyn Retriever> = Arc::new(HttpRetriever::new(format!(
        "{}/search",
        mock_server.uri()
    )));
    let orchestrator = orchestrator(
        gemini_client(&mock_server.uri()),
        Some(retriever),
        ToolRegistry::empty(),
    );

    let response = orchestrator
        .answer("What is the capital of France?", None)
        .await;

    assert_eq!(response.answer, "Paris is the capital of France.");
    assert_eq!(response.diagnostics.method, AnswerMethod::Direct);
    assert_eq!(response.diagnostics.documents_fetched, 2);
    // The 2.8-scored candidate fails the 1.5 threshold
    assert_eq!(response.diagnostics.documents_retained, 1);

    // Both turns were recorded into the session
    let stats = orchestrator
        .store()
        .session_stats(&response.session_id)
        .unwrap();
    assert_eq!(stats.total_messages, 2);
}

#[tokio::test]
async fn test_retrieval_failure_substitutes_marker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_string_contains(NO_KNOWLEDGE_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("I don't know.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let retriever: Arc<dyn Retriever> = Arc::new(HttpRetriever::new(format!(
        "{}/search",
        mock_server.uri()
    )));
    let orchestrator = orchestrator(
        gemini_client(&mock_server.uri()),
        Some(retriever),
        ToolRegistry::empty(),
    );

    let response = orchestrator.answer("Anything?", None).await;

    assert_eq!(response.answer, "I don't know.");
    assert_eq!(response.diagnostics.documents_fetched, 0);
    assert_eq!(response.diagnostics.documents_retained, 0);
}

#[tokio::test]
async fn test_tool_call_then_synthesis_end_to_end() {
    let mock_server = MockServer::start().await;

    // First model turn: a structured calculator request. The mock stops
    // matching after one use so later turns fall through to the next one.
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
            r#"{"tool": "calculator", "arguments": {"expression": "6*7"}}"#,
        )))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    // Every later turn (the post-tool turn and the synthesis call)
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("The answer is 42.")))
        .mount(&mock_server)
        .await;

    let orchestrator = orchestrator(
        gemini_client(&mock_server.uri()),
        None,
        ToolRegistry::with_tools(vec![Tool::calculator(), Tool::clock()]),
    );

    let response = orchestrator.answer("What is six times seven?", None).await;

    assert_eq!(response.answer, "The answer is 42.");
    assert_eq!(response.diagnostics.method, AnswerMethod::ToolLoop);
    assert_eq!(response.diagnostics.executed_tool_calls, 1);
}

#[tokio::test]
async fn test_second_turn_sees_first_turn_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("Nice to meet you, Ada.")))
        .mount(&mock_server)
        .await;

    let orchestrator = orchestrator(
        gemini_client(&mock_server.uri()),
        None,
        ToolRegistry::empty(),
    );

    let first = orchestrator.answer("My name is Ada.", None).await;
    let second = orchestrator
        .answer("What is my name?", Some(&first.session_id))
        .await;

    assert_eq!(second.session_id, first.session_id);
    // The second query's context window carried both first-turn messages
    assert_eq!(second.diagnostics.context.total_session_messages, 2);
    assert_eq!(second.diagnostics.context.message_count, 3);
    assert!(!second.diagnostics.context.truncated);
}

#[tokio::test]
async fn test_completion_outage_still_produces_an_answer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let orchestrator = orchestrator(
        gemini_client(&mock_server.uri()),
        None,
        ToolRegistry::empty(),
    );

    let response = orchestrator.answer("Hello?", None).await;

    assert_eq!(response.diagnostics.method, AnswerMethod::Fallback);
    assert!(!response.answer.is_empty());
    // The fallback answer was still recorded as the agent turn
    let stats = orchestrator
        .store()
        .session_stats(&response.session_id)
        .unwrap();
    assert_eq!(stats.total_messages, 2);
}
