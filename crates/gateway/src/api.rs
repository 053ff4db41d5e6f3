//! Route handlers, request/response DTOs and error mapping.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use docent_agent::{AskOutcome, ServiceStats, SessionSummary};
use docent_core::error::{Error, GenerationError, SessionError};
use docent_core::message::{Message, SessionId};
use docent_core::quiz::Quiz;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::SharedState;

pub const SESSION_ENDED: &str = "session ended";

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AskResponse {
    Ended {
        session_id: SessionId,
        status: String,
        quiz: Quiz,
    },
    Answer {
        session_id: SessionId,
        answer: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub session_id: SessionId,
    pub status: String,
    pub quiz: Quiz,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSession {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub service: ServiceStats,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ── Error mapping ─────────────────────────────────────────────────────────

/// Map a domain error to its HTTP status.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::Generation(GenerationError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        Error::Generation(_) | Error::Provider(_) => StatusCode::BAD_GATEWAY,
        Error::QuizFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Retrieval(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Config { .. } | Error::Serialization(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "Request failed");
    } else {
        warn!(status = status.as_u16(), error = %err, "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn ask_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    if payload.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    info!(
        query_len = payload.query.len(),
        session_id = payload.session_id.as_deref().unwrap_or("-"),
        "ask request"
    );

    let outcome = state
        .service
        .ask(&payload.query, payload.session_id.as_deref())
        .await
        .map_err(error_response)?;

    Ok(Json(match outcome {
        AskOutcome::Answer { session_id, answer } => AskResponse::Answer { session_id, answer },
        AskOutcome::Ended { session_id, quiz } => AskResponse::Ended {
            session_id,
            status: SESSION_ENDED.into(),
            quiz,
        },
    }))
}

pub async fn end_session_handler(
    State(state): State<SharedState>,
    Json(payload): Json<EndSessionRequest>,
) -> ApiResult<Json<EndSessionResponse>> {
    let quiz = state
        .service
        .end_session(&payload.session_id)
        .await
        .map_err(error_response)?;

    Ok(Json(EndSessionResponse {
        session_id: SessionId::from(payload.session_id.as_str()),
        status: SESSION_ENDED.into(),
        quiz,
    }))
}

pub async fn create_session_handler(
    State(state): State<SharedState>,
) -> (StatusCode, Json<CreatedSession>) {
    let (session_id, created_at) = state.service.create_session().await;
    (
        StatusCode::CREATED,
        Json(CreatedSession {
            session_id,
            created_at,
        }),
    )
}

pub async fn list_sessions_handler(State(state): State<SharedState>) -> Json<SessionList> {
    let sessions = state.service.summaries().await;
    Json(SessionList {
        count: sessions.len(),
        sessions,
    })
}

pub async fn session_messages_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TranscriptResponse>> {
    let messages = state
        .service
        .transcript(&id)
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(TranscriptResponse {
        session_id: id,
        messages,
    }))
}

pub async fn delete_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .service
        .discard(&id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats_handler(State(state): State<SharedState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        service: state.service.stats().await,
        uptime_secs: (Utc::now() - state.start_time).num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::error::{ProviderError, QuizFormatError, RetrievalError};

    #[test]
    fn error_status_mapping() {
        let cases: Vec<(Error, StatusCode)> = vec![
            (
                SessionError::NotFound("x".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                GenerationError::Timeout { timeout_ms: 5_000 }.into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (GenerationError::EmptyResponse.into(), StatusCode::BAD_GATEWAY),
            (
                GenerationError::Backend(ProviderError::Network("down".into())).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                QuizFormatError::Unparseable("prose".into()).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RetrievalError::Unavailable("offline".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Internal("bug".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{err}");
        }
    }

    #[test]
    fn ended_response_shape() {
        let response = AskResponse::Ended {
            session_id: SessionId::from("S1"),
            status: SESSION_ENDED.into(),
            quiz: Quiz(vec![]),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["session_id"], "S1");
        assert_eq!(json["status"], "session ended");
        assert!(json["quiz"].is_array());
    }

    #[test]
    fn ask_request_session_id_is_optional() {
        let req: AskRequest = serde_json::from_str(r#"{"query": "What is X?"}"#).unwrap();
        assert!(req.session_id.is_none());
        let req: AskRequest =
            serde_json::from_str(r#"{"query": "q", "session_id": null}"#).unwrap();
        assert!(req.session_id.is_none());
    }
}
