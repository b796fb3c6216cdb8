//! HTTP server, router, and API handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::admin::{AdminClient, AdminError, ClientRecord, ClientUpdate, NewClient};
use crate::config::AppConfig;
use crate::relay::WebhookRelay;
use crate::security;
use crate::security::claims::UserContext;
use crate::security::rate_limit::RateLimiter;
use crate::session::{ChatError, ChatSession, Message, SendOutcome, SessionStore};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.resilience.relay_timeout_secs))
        .build()?;

    let relay = Arc::new(WebhookRelay::new(http.clone()));

    let admin = match &config.admin.service_url {
        Some(raw) => {
            let endpoint = raw.parse::<url::Url>()?;
            info!(
                name: "admin.service.configured",
                endpoint = %endpoint,
                "Admin data service configured"
            );
            Some(Arc::new(AdminClient::new(
                http,
                endpoint,
                config.admin.service_token.clone(),
            )))
        }
        None => None,
    };

    let rate_limiter = Arc::new(RateLimiter::new(
        config.resilience.requests_per_second,
        config.resilience.burst_size,
    ));

    let state = AppState {
        sessions: SessionStore::new(),
        relay,
        admin,
        rate_limiter,
        config: config.clone(),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router with all middleware applied.
#[must_use]
pub fn router(state: AppState) -> Router {
    // Disabling the timeout swaps in a duration that will never fire, so the
    // router type stays the same either way.
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(30)
    };

    Router::new()
        .route("/api/chat", post(api_chat))
        .route(
            "/api/sessions",
            get(api_list_sessions).post(api_create_session),
        )
        .route(
            "/api/sessions/{id}",
            get(api_get_session).delete(api_delete_session),
        )
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        .route("/api/sessions/{id}/reset", post(api_reset_session))
        .route(
            "/api/admin/clients",
            get(api_admin_list_clients).post(api_admin_create_client),
        )
        .route(
            "/api/admin/clients/{id}",
            put(api_admin_update_client).delete(api_admin_delete_client),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            security::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => {
                            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                        }
                    }
                }
            },
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            security::rate_limit::rate_limit_middleware,
        ))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat API
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
    /// Optional session ID (a new session is started if not provided).
    #[serde(default)]
    session_id: Option<String>,
}

/// Response from the chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// Session ID for this conversation.
    session_id: String,
    /// Assistant reply; absent when the input was ignored as empty.
    reply: Option<Message>,
}

/// POST /api/chat - Relay one user turn to the acting tenant's webhook.
async fn api_chat(
    State(state): State<AppState>,
    user: Option<Extension<UserContext>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let session = match req.session_id.as_deref() {
        Some(id) if !id.is_empty() => state.sessions.get_or_start(id),
        _ => state.sessions.start(),
    };

    let endpoint = user.as_ref().and_then(|ext| ext.0.webhook_endpoint());

    tracing::info!(
        session_id = %session.id(),
        has_endpoint = endpoint.is_some(),
        "Received chat request"
    );

    match session.send(&req.message, endpoint, &state.relay).await {
        Ok(SendOutcome::Replied(reply)) => Ok(Json(ChatResponse {
            session_id: session.id().to_string(),
            reply: Some(reply),
        })),
        Ok(SendOutcome::Ignored) => Ok(Json(ChatResponse {
            session_id: session.id().to_string(),
            reply: None,
        })),
        Err(err) => {
            tracing::warn!(session_id = %session.id(), error = %err, "Chat send failed");
            Err(chat_error_response(&err))
        }
    }
}

fn chat_error_response(err: &ChatError) -> (StatusCode, String) {
    let status = match err {
        ChatError::Configuration => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::Delivery(_) => StatusCode::BAD_GATEWAY,
        ChatError::Busy | ChatError::Closed => StatusCode::CONFLICT,
    };
    (status, err.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Session API
// ─────────────────────────────────────────────────────────────────────────────

/// Session summary for API responses.
#[derive(Debug, Serialize)]
struct SessionInfo {
    id: String,
    message_count: usize,
    pending: bool,
}

impl SessionInfo {
    fn from_session(session: &ChatSession) -> Self {
        Self {
            id: session.id().to_string(),
            message_count: session.message_count(),
            pending: session.is_pending(),
        }
    }
}

/// GET /api/sessions - List all sessions.
async fn api_list_sessions(State(state): State<AppState>) -> Json<Vec<SessionInfo>> {
    let sessions = state
        .sessions
        .list_ids()
        .iter()
        .filter_map(|id| {
            state
                .sessions
                .get(id)
                .map(|session| SessionInfo::from_session(&session))
        })
        .collect();
    Json(sessions)
}

/// POST /api/sessions - Start a new session.
async fn api_create_session(State(state): State<AppState>) -> Json<SessionInfo> {
    let session = state.sessions.start();
    tracing::debug!(session_id = %session.id(), "Started new session");
    Json(SessionInfo::from_session(&session))
}

/// GET /api/sessions/:id - Get session details.
async fn api_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, StatusCode> {
    match state.sessions.get(&id) {
        Some(session) => Ok(Json(SessionInfo::from_session(&session))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// DELETE /api/sessions/:id - Delete a session, cancelling in-flight work.
async fn api_delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match state.sessions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// GET /api/sessions/:id/messages - Get the session transcript.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    match state.sessions.get(&id) {
        Some(session) => Ok(Json(session.transcript())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /api/sessions/:id/reset - Discard a conversation, start a fresh one.
async fn api_reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<SessionInfo> {
    let session = state.sessions.reset(&id);
    info!(
        name: "session.reset",
        old_session_id = %id,
        session_id = %session.id(),
        "Session reset"
    );
    Json(SessionInfo::from_session(&session))
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin API
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for client deletion; the username keys the credential.
#[derive(Debug, Deserialize)]
struct DeleteClientQuery {
    username: String,
}

/// GET /api/admin/clients - List tenant records.
async fn api_admin_list_clients(
    State(state): State<AppState>,
    user: Option<Extension<UserContext>>,
) -> Result<Json<Vec<ClientRecord>>, (StatusCode, String)> {
    check_admin(user.as_ref())?;
    let admin = admin_client(&state)?;
    let clients = admin.list_clients().await.map_err(admin_error_response)?;
    Ok(Json(clients))
}

/// POST /api/admin/clients - Provision a tenant and its credential.
async fn api_admin_create_client(
    State(state): State<AppState>,
    user: Option<Extension<UserContext>>,
    Json(req): Json<NewClient>,
) -> Result<(StatusCode, Json<ClientRecord>), (StatusCode, String)> {
    check_admin(user.as_ref())?;
    let admin = admin_client(&state)?;
    let record = admin
        .create_client(&req)
        .await
        .map_err(admin_error_response)?;
    info!(
        name: "admin.client.created",
        client_id = %record.id,
        username = %record.username,
        "Client created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/admin/clients/:id - Update a tenant's name and webhook endpoint.
async fn api_admin_update_client(
    State(state): State<AppState>,
    user: Option<Extension<UserContext>>,
    Path(id): Path<String>,
    Json(req): Json<ClientUpdate>,
) -> Result<Json<ClientRecord>, (StatusCode, String)> {
    check_admin(user.as_ref())?;
    let admin = admin_client(&state)?;
    let record = admin
        .update_client(&id, &req)
        .await
        .map_err(admin_error_response)?;
    Ok(Json(record))
}

/// DELETE /api/admin/clients/:id - Remove a tenant and its credential.
async fn api_admin_delete_client(
    State(state): State<AppState>,
    user: Option<Extension<UserContext>>,
    Path(id): Path<String>,
    Query(query): Query<DeleteClientQuery>,
) -> Result<StatusCode, (StatusCode, String)> {
    check_admin(user.as_ref())?;
    let admin = admin_client(&state)?;
    admin
        .delete_client(&id, &query.username)
        .await
        .map_err(admin_error_response)?;
    info!(name: "admin.client.deleted", client_id = %id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn check_admin(user: Option<&Extension<UserContext>>) -> Result<(), (StatusCode, String)> {
    security::middleware::require_admin(user.map(|ext| &ext.0)).map_err(|status| {
        let detail = if status == StatusCode::UNAUTHORIZED {
            "authentication required"
        } else {
            "admin role required"
        };
        (status, detail.to_string())
    })
}

fn admin_client(state: &AppState) -> Result<&Arc<AdminClient>, (StatusCode, String)> {
    state.admin.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "admin data service is not configured".to_string(),
    ))
}

fn admin_error_response(err: AdminError) -> (StatusCode, String) {
    tracing::error!(error = %err, "Admin data service call failed");
    match &err {
        AdminError::Rejected { status, .. } => (*status, err.to_string()),
        _ => (StatusCode::BAD_GATEWAY, err.to_string()),
    }
}
