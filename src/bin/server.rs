//! mindrx HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8080)
//! - `MINDRX_STATES_DIR` - Extra state files loaded over the built-ins
//! - `RUST_LOG` - Tracing filter (default: "info,mindrx=debug")
//! - Provider credentials (`OPENAI_API_KEY`, ...) are read per request
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use anyhow::Context;
use mindrx::config::ServerConfig;
use mindrx::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    let state = AppState::with_states(config.state_registry()?);
    let state_count = state.states.len();
    let app = app_router(state);

    let bind_addr = config.bind_addr();
    tracing::info!("mindrx server starting on {}", bind_addr);
    tracing::info!("{} states loaded", state_count);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          - liveness probe");
    tracing::info!("  GET  /api/states      - state listing");
    tracing::info!("  POST /api/chat        - streaming chat (SSE)");
    tracing::info!("  *    /api/agents[/:id] - agent CRUD");

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
