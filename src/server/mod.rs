//! HTTP server exposing states, streaming chat and saved agents.
//!
//! # Endpoints
//!
//! - `GET  /health`      - Liveness probe
//! - `GET  /api/states`  - State listing
//! - `POST /api/chat`    - Server-sent event chat stream
//! - `/api/agents[/:id]` - Agent CRUD

pub mod routes;

pub use routes::{app_router, AppState, ChatEvent, ChatRequest};
