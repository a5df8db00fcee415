//! HTTP surface of the bot.
//!
//! Discord posts signed interactions to `/interactions` (or `/`). Selection
//! replies arrive on `/followup`, the daily report is triggered through
//! `/scout`, and `/health` reports liveness. Handlers answer within
//! Discord's response window and hand long work to spawned tasks.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::core::scout::{run_daily_scout, CHUNK_PAUSE};
use crate::core::workflow::short_token;
use crate::core::{ServerConfig, Workflow, WorkflowError};

use super::interactions::{
    Interaction, InteractionKind, InteractionResponse, SignatureError, SignatureVerifier,
    DEFAULT_OUTLINE_TOPIC, DRAFT_COMMAND, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}

impl From<SignatureError> for ApiError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::MissingKey | SignatureError::InvalidKey(_) => {
                ApiError::Internal(e.to_string())
            }
            SignatureError::MissingHeaders | SignatureError::Invalid => {
                ApiError::Unauthorized(e.to_string())
            }
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Shared handler state.
pub struct ApiState {
    workflow: Workflow,
    verifier: Option<SignatureVerifier>,
    chunk_size: usize,
    scout_pause: Duration,
}

impl ApiState {
    /// Create state around a workflow.
    ///
    /// Without a verifier every interaction is refused with a 500.
    pub fn new(workflow: Workflow, verifier: Option<SignatureVerifier>, chunk_size: usize) -> Self {
        Self { workflow, verifier, chunk_size, scout_pause: CHUNK_PAUSE }
    }

    /// Override the pause between report chunks.
    pub fn with_scout_pause(mut self, pause: Duration) -> Self {
        self.scout_pause = pause;
        self
    }

    /// The workflow.
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        let verifier = self.verifier.as_ref().ok_or(SignatureError::MissingKey)?;
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let (Some(signature), Some(timestamp)) = (header(SIGNATURE_HEADER), header(TIMESTAMP_HEADER))
        else {
            return Err(SignatureError::MissingHeaders);
        };
        verifier.verify(signature, timestamp, body)
    }
}

/// Follow-up reply body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowupRequest {
    pub token: String,
    #[serde(default)]
    pub content: String,
}

/// Follow-up reply outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

/// Build the router.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", post(interactions))
        .route("/interactions", post(interactions))
        .route("/followup", post(followup))
        .route("/scout", get(scout))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the router until the process is stopped.
pub async fn serve(config: &ServerConfig, state: Arc<ApiState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening for interactions");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn interactions(
    State(st): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<InteractionResponse>> {
    if let Err(e) = st.verify(&headers, &body) {
        tracing::warn!(error = %e, "Rejected interaction");
        return Err(e.into());
    }

    let interaction: Interaction =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(dispatch(&st, interaction)))
}

fn dispatch(st: &ApiState, interaction: Interaction) -> InteractionResponse {
    match interaction.kind() {
        InteractionKind::Ping => InteractionResponse::pong(),
        InteractionKind::ApplicationCommand => command(st, interaction),
        InteractionKind::MessageComponent => InteractionResponse::message(
            "👉 Reply with a number from **1** to **4** to make your selection.",
        ),
        InteractionKind::Other(kind) => {
            tracing::debug!(kind, "Unknown interaction type");
            InteractionResponse::message("Unknown Interaction")
        }
    }
}

fn command(st: &ApiState, interaction: Interaction) -> InteractionResponse {
    let token = interaction.token.clone();
    let name = interaction.command_name().to_string();
    tracing::info!(command = %name, token = %short_token(&token), "Command received");

    match name.as_str() {
        "blog" => {
            let workflow = st.workflow.clone();
            tokio::spawn(async move {
                workflow.start(&token).await;
            });
            InteractionResponse::deferred()
        }
        "outlines" => {
            let query = interaction.string_option("topic").unwrap_or(DEFAULT_OUTLINE_TOPIC).to_string();
            let workflow = st.workflow.clone();
            tokio::spawn(async move {
                workflow.start_with_topic(&token, &query).await;
            });
            InteractionResponse::deferred()
        }
        DRAFT_COMMAND => match interaction.target_message() {
            Some(intel) => {
                let intel = intel.to_string();
                let workflow = st.workflow.clone();
                tokio::spawn(async move {
                    let _ = workflow.draft(&token, &intel).await;
                });
                InteractionResponse::deferred()
            }
            None => InteractionResponse::message("❌ Error: Could not find message context."),
        },
        _ => InteractionResponse::message("❌ Unknown command"),
    }
}

async fn followup(
    State(st): State<Arc<ApiState>>,
    Json(req): Json<FollowupRequest>,
) -> Json<FollowupResponse> {
    match st.workflow.begin_followup(&req.token, &req.content) {
        Ok(pending) => {
            let status = pending.status();
            let workflow = st.workflow.clone();
            tokio::spawn(async move {
                workflow.complete(pending).await;
            });
            Json(FollowupResponse { status: status.to_string(), message: None })
        }
        Err(e) => {
            let status = match e {
                WorkflowError::InvalidSelection(_) => "invalid_input",
                WorkflowError::SessionNotFound => "session_not_found",
                WorkflowError::SelectionInProgress => "in_progress",
                _ => "error",
            };
            tracing::debug!(token = %short_token(&req.token), error = %e, "Follow-up rejected");
            Json(FollowupResponse { status: status.to_string(), message: Some(e.user_message()) })
        }
    }
}

async fn scout(State(st): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    let workflow = &st.workflow;
    match run_daily_scout(workflow.fetcher(), workflow.messenger().as_ref(), st.chunk_size, st.scout_pause)
        .await
    {
        Ok(summary) => Json(serde_json::json!({
            "status": "sent",
            "topics": summary.topics,
            "timestamp": summary.timestamp.to_rfc3339(),
        })),
        Err(e) => {
            tracing::error!(error = %e, "Daily scout failed");
            Json(serde_json::json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

async fn health(State(st): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), sessions: st.workflow.sessions().len() })
}
