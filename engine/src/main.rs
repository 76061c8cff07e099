// Sage query-orchestration engine
// Main entry point for the sage binary

use clap::Parser;
use sage_engine::agent::{ToolLoop, ToolLoopConfig};
use sage_engine::cli::{Cli, Command};
use sage_engine::config::Config;
use sage_engine::conversation::ConversationStore;
use sage_engine::llm::GeminiClient;
use sage_engine::orchestrator::{OrchestratorConfig, QueryOrchestrator, QueryResponse};
use sage_engine::relevance::RelevanceFilter;
use sage_engine::retrieval::HttpRetriever;
use sage_engine::telemetry::{init_telemetry, init_telemetry_with_level};
use sage_engine::tools::ToolRegistry;
use sdk::errors::EngineError;
use sdk::services::{CompletionService, Retriever};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Basic telemetry first, so config loading can log
    init_telemetry();

    let config = if let Some(path) = &cli.config {
        Config::load_from_path(path)?
    } else {
        Config::load_or_default()?
    };

    // Re-initialize with the config-driven log level
    // (only takes effect if RUST_LOG env var is not set)
    init_telemetry_with_level(&config.core.log_level);

    tracing::info!("Sage Engine v{}", env!("CARGO_PKG_VERSION"));

    let orchestrator = build_orchestrator(&config).await?;

    match cli.command {
        Command::Ask { question, session } => {
            let response = orchestrator.answer(&question, session.as_deref()).await;
            print_response(&response, cli.json)?;
        }

        Command::Repl => {
            println!("Sage ready. Empty line exits.");
            let stdin = io::stdin();
            let mut session: Option<String> = None;

            loop {
                print!("> ");
                io::stdout().flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let question = line.trim();
                if question.is_empty() {
                    break;
                }

                let response = orchestrator.answer(question, session.as_deref()).await;
                session = Some(response.session_id.clone());
                print_response(&response, cli.json)?;
            }
        }
    }

    Ok(())
}

fn print_response(response: &QueryResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        println!("{}", response.answer);
    }
    Ok(())
}

/// Wire the engine together from configuration and environment.
async fn build_orchestrator(config: &Config) -> Result<QueryOrchestrator, EngineError> {
    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    let completion: Arc<dyn CompletionService> =
        Arc::new(GeminiClient::new(config.llm.clone(), api_key));

    // A dead completion service is the one failure reported distinctly,
    // so the caller can decide whether degraded operation makes sense.
    if !completion.check_health().await {
        return Err(EngineError::CompletionUnavailable(
            "set GEMINI_API_KEY to reach the completion service".to_string(),
        ));
    }

    let retriever: Option<Arc<dyn Retriever>> = config
        .retrieval
        .endpoint
        .as_ref()
        .map(|endpoint| Arc::new(HttpRetriever::new(endpoint.clone())) as Arc<dyn Retriever>);
    if retriever.is_none() {
        tracing::warn!("No retrieval endpoint configured; answering without knowledge base");
    }

    let weather_api_key = std::env::var("OPENWEATHER_API_KEY").ok();
    let tools = Arc::new(ToolRegistry::from_config(
        &config.tools,
        config.core.workspace.clone(),
        completion.clone(),
        weather_api_key,
    ));
    tracing::info!("Registered tools: {}", tools.names().join(", "));

    let tool_loop = ToolLoop::new(
        completion,
        tools,
        ToolLoopConfig {
            max_tool_calls: config.agent.max_tool_calls,
        },
    );

    Ok(QueryOrchestrator::new(
        ConversationStore::new(config.conversation.store_config()),
        RelevanceFilter::new(config.retrieval.threshold, config.retrieval.min_docs),
        tool_loop,
        retriever,
        OrchestratorConfig {
            retrieval_k: config.retrieval.k,
        },
    ))
}
