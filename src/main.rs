use rmcp::{ServiceExt, transport::stdio};
use rustdoc_implementors::config::Config;
use rustdoc_implementors::server::ImplementorServer;
use rustdoc_implementors::state::{IndexState, spawn_initial_load};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustdoc_implementors::tracing::init();

    tracing::info!("Starting rustdoc-implementors MCP server");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring config: {}", e);
            Config::default()
        }
    };
    tracing::debug!(?config, "Using configuration");

    let state = Arc::new(IndexState::new(config));

    // Load whatever documentation can be found without delaying the handshake
    let _loader = spawn_initial_load(state.clone());

    let server = ImplementorServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}
