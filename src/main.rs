//! MCP Server Entry Point
//!
//! This is the main entry point for the MCP server. It loads configuration,
//! initializes logging, connects the external collaborators, and starts the
//! server with the configured transport.

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use prompt_saver_mcp::core::{Config, McpServer, TransportService};
use prompt_saver_mcp::domains::library::PromptLibrary;
use prompt_saver_mcp::providers::{OpenAiCompletions, VoyageEmbeddings};
use prompt_saver_mcp::storage::MongoPromptStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    // Refuse to start with missing credentials rather than fail on the
    // first tool call.
    config.validate()?;

    // Connect the external collaborators
    let store = MongoPromptStore::connect(&config.storage).await?;
    let embeddings = VoyageEmbeddings::from_config(&config.embedding)?;
    let completions = OpenAiCompletions::from_config(&config.completion)?;

    let library = Arc::new(PromptLibrary::new(
        Arc::new(store),
        Arc::new(embeddings),
        Arc::new(completions),
    ));

    // Create the MCP server
    let server = McpServer::new(config.clone(), library);

    info!("Server initialized");

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format. Logs go to
/// stderr so the stdio transport keeps stdout for protocol traffic.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
