// HTTP request handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::middleware::{auth_middleware, AuthenticatedUser};
use super::types::{
    EndSessionRequest, EndSessionResponse, GenerateRequest, GenerateResponse, HealthStatus,
    StartSessionRequest, StartSessionResponse,
};
use super::session::{Session, SessionError};
use super::CompanionServer;
use crate::conversation::Message;
use crate::errors::ApiError;
use crate::escalation::EscalationContext;
use crate::metrics::fingerprint;
use crate::providers::prompt::build_prompt;
use crate::providers::{generate_self_care, SelfCareContent};

/// Create the main application router
pub fn create_router(server: Arc<CompanionServer>) -> Router {
    let ai_routes = Router::new()
        .route("/ai/start-session", post(start_session))
        .route("/ai/end-session", post(end_session))
        .route("/ai/session-generate", post(session_generate))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&server),
            auth_middleware,
        ));

    Router::new()
        .merge(ai_routes)
        .route("/ai/self-care-home", get(self_care_home))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .with_state(server)
}

/// Handle POST /ai/start-session
async fn start_session(
    State(server): State<Arc<CompanionServer>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    if !(1..=10).contains(&request.mood) {
        return Err(ApiError::BadRequest(
            "Mood must be between 1 and 10".to_string(),
        ));
    }

    let session = server
        .sessions()
        .start(&user.user_id, Some(request.mood as u8))?;

    Ok(Json(StartSessionResponse {
        session_id: session.id,
    }))
}

/// Handle POST /ai/end-session
async fn end_session(
    State(server): State<Arc<CompanionServer>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<EndSessionRequest>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    server
        .sessions()
        .terminate(&request.session_id, &user.user_id)?;

    Ok(Json(EndSessionResponse {
        message: "Session ended".to_string(),
    }))
}

/// Handle POST /ai/session-generate - main chat endpoint
///
/// The classifier runs before the session is resolved or the chat provider
/// is consulted. Crisis messages are answered by the escalation workflow and
/// never reach the provider. Session errors do not block a crisis reply; the
/// exchange is then answered under an unsaved session id.
async fn session_generate(
    State(server): State<Arc<CompanionServer>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    let classification = server.detector().classify(&request.prompt);
    server.metrics().record_classification(&classification);

    let session = resolve_session(&server, &user, request.session_id.as_deref());

    tracing::debug!(
        session_id = ?session.as_ref().ok().map(|s| s.id.as_str()),
        prompt = %fingerprint(&request.prompt),
        crisis = classification.is_crisis,
        "Classified message"
    );

    if classification.is_crisis {
        let session = match session {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %user.user_id,
                    "Session unavailable, answering crisis without a transcript"
                );
                None
            }
        };
        let session_id = session
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let context = EscalationContext {
            user_id: user.user_id.clone(),
            session_id: session_id.clone(),
        };
        let outcome = server.orchestrator().escalate(&context, &classification).await;
        server.metrics().record_escalation(&outcome);

        if session.is_some() {
            if let Err(e) = server.sessions().append(
                &session_id,
                [Message::user(request.prompt), Message::bot(outcome.text.clone())],
            ) {
                tracing::warn!(error = %e, session_id = %session_id, "Failed to record crisis exchange");
            }
        }

        return Ok(Json(GenerateResponse::crisis(session_id, outcome)));
    }

    let session = session?;
    let settings = server.config();
    let history = session
        .transcript
        .recent(settings.history_messages, settings.history_chars);
    let prompt = build_prompt(history, &request.prompt);

    let text = server
        .provider()
        .generate(&prompt)
        .await
        .map_err(ApiError::Upstream)?;

    server.sessions().append(
        &session.id,
        [Message::user(request.prompt), Message::bot(text.clone())],
    )?;

    Ok(Json(GenerateResponse::companion(text, session.id)))
}

/// Look up the caller's live session, or open one when no id was sent
fn resolve_session(
    server: &CompanionServer,
    user: &AuthenticatedUser,
    session_id: Option<&str>,
) -> Result<Session, SessionError> {
    match session_id {
        Some(id) => server.sessions().get_active(id, &user.user_id),
        None => server.sessions().start(&user.user_id, None),
    }
}

/// Handle GET /ai/self-care-home - daily quote, focus tip and article
async fn self_care_home(
    State(server): State<Arc<CompanionServer>>,
) -> Result<Json<SelfCareContent>, ApiError> {
    let today = Utc::now().date_naive();
    let content = generate_self_care(server.provider().as_ref(), today)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(content))
}

/// Handle GET /health - Health check endpoint
pub async fn health_check(State(server): State<Arc<CompanionServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        uptime_seconds: server.uptime().as_secs(),
        active_sessions: server.sessions().active_count(),
        crisis_rules: server.detector().library().rule_count(),
        provider: server.provider().name().to_string(),
    })
}

/// Handle GET /metrics - Prometheus metrics endpoint
pub async fn metrics_endpoint(
    State(server): State<Arc<CompanionServer>>,
) -> Result<Response, ApiError> {
    server
        .metrics()
        .set_active_sessions(server.sessions().active_count());
    let body = server.metrics().render()?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
