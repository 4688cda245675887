//! Axum route handlers for the mindrx HTTP server.
//!
//! # Routes
//!
//! - `GET    /health`          - Returns `{"status": "ok", "version": ..., "service": "mindrx"}`
//! - `GET    /api/states`      - List registered states with parameters and behavior
//! - `POST   /api/chat`        - Stream a state-modulated completion as server-sent events
//! - `GET    /api/agents`      - List saved agents
//! - `POST   /api/agents`      - Create an agent
//! - `GET    /api/agents/:id`  - Fetch one agent
//! - `PUT    /api/agents/:id`  - Merge fields into an agent
//! - `DELETE /api/agents/:id`  - Remove an agent

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agents::{AgentError, AgentPatch, AgentRepository, InMemoryAgentRepository, NewAgent};
use crate::client::{MindRx, MindRxOptions};
use crate::states::{StateEngine, StateRegistry};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// States available to chat requests and the listing endpoint.
    pub states: Arc<StateRegistry>,
    /// Agent storage.
    pub agents: Arc<dyn AgentRepository>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_states(StateRegistry::with_builtin())
    }

    pub fn with_states(states: StateRegistry) -> Self {
        Self {
            states: Arc::new(states),
            agents: Arc::new(InMemoryAgentRepository::new()),
        }
    }

    pub fn with_agents(mut self, agents: Arc<dyn AgentRepository>) -> Self {
        self.agents = agents;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/states", get(list_states_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/agents", get(list_agents_handler).post(create_agent_handler))
        .route(
            "/api/agents/:id",
            get(get_agent_handler)
                .put(update_agent_handler)
                .delete(delete_agent_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// GET /health - liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "mindrx",
    }))
}

/// GET /api/states
async fn list_states_handler(State(state): State<AppState>) -> impl IntoResponse {
    let states: Vec<Value> = state
        .states
        .list()
        .into_iter()
        .map(|s| {
            json!({
                "name": s.name,
                "description": s.description,
                "parameters": s.parameters,
                "behavior": s.behavior,
            })
        })
        .collect();

    Json(json!({ "states": states }))
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// State name.
    pub profile: Option<String>,
    pub intensity: Option<f64>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl ChatRequest {
    /// The message with any prior turns folded in ahead of it.
    pub fn prompt(&self) -> String {
        if self.history.is_empty() {
            return self.message.clone();
        }

        let history = self
            .history
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    ChatRole::User => "User",
                    ChatRole::Assistant => "Assistant",
                };
                format!("{}: {}", speaker, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("Previous conversation:\n{}\n\nUser: {}", history, self.message)
    }
}

/// One server-sent event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Start,
    Chunk { text: String },
    Done,
    Error { error: String },
}

impl ChatEvent {
    fn into_event(self) -> Result<Event, axum::Error> {
        Event::default().json_data(self)
    }
}

/// POST /api/chat
///
/// Emits `start`, then a `chunk` per non-empty piece of text, `done` when the
/// provider signals completion, or `error` if the stream fails midway.
/// Failures before streaming starts return 500 JSON.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let prompt = request.prompt();
    tracing::debug!(
        profile = request.profile.as_deref().unwrap_or_default(),
        provider = request.provider.as_deref().unwrap_or_default(),
        history = request.history.len(),
        "Chat request"
    );

    let engine = StateEngine::from_registry(state.states.as_ref().clone());
    let mut rx = MindRx::with_engine(
        engine,
        MindRxOptions {
            state: request.profile,
            provider: request.provider,
            model: request.model,
            api_key: request.api_key,
            base_url: request.base_url,
            intensity: request.intensity,
            ..Default::default()
        },
    );

    let mut chunks = rx.stream(&prompt).map_err(|e| {
        tracing::warn!(error = %e, "Chat setup failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let events = async_stream::stream! {
        yield ChatEvent::Start.into_event();
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    if !chunk.text.is_empty() {
                        yield ChatEvent::Chunk { text: chunk.text }.into_event();
                    }
                    if chunk.done {
                        yield ChatEvent::Done.into_event();
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Chat stream failed");
                    yield ChatEvent::Error { error: e.to_string() }.into_event();
                    break;
                }
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

fn agent_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Agent not found")
}

/// GET /api/agents
async fn list_agents_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "agents": state.agents.list().await }))
}

/// POST /api/agents
async fn create_agent_handler(
    State(state): State<AppState>,
    Json(input): Json<NewAgent>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let agent = input.into_agent().map_err(|e| match e {
        AgentError::MissingFields => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        AgentError::NotFound(_) => agent_not_found(),
    })?;

    tracing::info!(agent_id = %agent.id, name = %agent.name, "Agent created");
    state.agents.put(agent.clone()).await;
    Ok((StatusCode::CREATED, Json(json!({ "agent": agent }))))
}

/// GET /api/agents/:id
async fn get_agent_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let agent = state.agents.get(&id).await.ok_or_else(agent_not_found)?;
    Ok(Json(json!({ "agent": agent })))
}

/// PUT /api/agents/:id
async fn update_agent_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<AgentPatch>,
) -> Result<Json<Value>, ApiError> {
    let mut agent = state.agents.get(&id).await.ok_or_else(agent_not_found)?;
    patch.apply(&mut agent);
    state.agents.put(agent.clone()).await;
    Ok(Json(json!({ "agent": agent })))
}

/// DELETE /api/agents/:id
async fn delete_agent_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.agents.delete(&id).await.ok_or_else(agent_not_found)?;
    tracing::info!(agent_id = %id, "Agent deleted");
    Ok(Json(json!({ "message": "Agent deleted successfully" })))
}
