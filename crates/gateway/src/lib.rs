//! HTTP API gateway for Docent.
//!
//! Exposes the chat service over REST: asking questions, ending sessions
//! into quizzes, session listing and transcripts, health and stats.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use docent_agent::{ChatService, SessionRegistry, spawn_reaper};
use docent_config::{AppConfig, GatewayConfig};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub service: ChatService,
    pub start_time: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(service: ChatService) -> Self {
        Self {
            service,
            start_time: Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all API routes and no middleware.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(api::health_handler))
        .route("/ask", post(api::ask_handler))
        .route("/end_session", post(api::end_session_handler))
        .route(
            "/sessions",
            post(api::create_session_handler).get(api::list_sessions_handler),
        )
        .route("/sessions/{id}", delete(api::delete_session_handler))
        .route("/sessions/{id}/messages", get(api::session_messages_handler))
        .route("/stats", get(api::stats_handler))
        .with_state(state)
}

/// Build the router with body limit, CORS and trace layers applied.
pub fn build_full_router(state: SharedState, config: &GatewayConfig) -> Router {
    build_router(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Any origin when none are configured, otherwise exactly the listed ones.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server.
///
/// Builds provider, retriever and session registry once, spawns the idle
/// reaper, then serves until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = docent_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or("No default provider configured")?;

    let retriever = docent_index::build_retriever(&config.retrieval, provider.clone()).await?;
    if retriever.is_empty() {
        warn!("Corpus is empty, answers will not be grounded in any document");
    }

    let registry = Arc::new(SessionRegistry::from_config(&config.session));
    let reaper = spawn_reaper(
        registry.clone(),
        Duration::from_secs(config.session.reap_interval_secs),
    );

    let service = ChatService::from_config(&config, provider, retriever, registry);
    let state = Arc::new(GatewayState::new(service));
    let app = build_full_router(state, &config.gateway);

    info!(
        addr = %addr,
        model = %config.active_model(),
        provider = %config.default_provider,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(reaper) = reaper {
        reaper.abort();
    }
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use docent_agent::{Answerer, Generator, QuizSynthesizer};
    use docent_core::error::{ProviderError, RetrievalError};
    use docent_core::message::Message;
    use docent_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use docent_core::retrieval::{Passage, Retriever};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Mock provider for gateway tests: scripted results in order.
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String, ProviderError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("ScriptedProvider exhausted");
            next.map(|text| ProviderResponse {
                message: Message::assistant(text),
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    struct FixedRetriever {
        available: bool,
    }

    #[async_trait::async_trait]
    impl Retriever for FixedRetriever {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
            if !self.available {
                return Err(RetrievalError::Unavailable("index offline".into()));
            }
            Ok(vec![Passage::new("X is a concept.")].into_iter().take(k).collect())
        }

        fn len(&self) -> usize {
            1
        }
    }

    fn quiz_json() -> String {
        let items: Vec<serde_json::Value> = (1..=5)
            .map(|i| {
                serde_json::json!({
                    "question": format!("Q{i}?"),
                    "options": ["a", "b", "c", "d"],
                    "answer": "c",
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    fn state_with(
        responses: Vec<Result<String, ProviderError>>,
        retrieval_available: bool,
    ) -> SharedState {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(responses));
        let retriever: Arc<dyn Retriever> = Arc::new(FixedRetriever {
            available: retrieval_available,
        });
        let generator = Generator::new(provider, "mock-model");
        let service = ChatService::new(
            Arc::new(SessionRegistry::new()),
            Answerer::new(retriever, generator.clone()),
            QuizSynthesizer::new(generator),
        );
        Arc::new(GatewayState::new(service))
    }

    fn state(responses: &[&str]) -> SharedState {
        state_with(responses.iter().map(|r| Ok(r.to_string())).collect(), true)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(state(&[]));
        let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn ask_creates_session_and_answers() {
        let app = build_router(state(&["X is explained as a concept."]));
        let response = app
            .oneshot(json_request("POST", "/ask", serde_json::json!({"query": "What is X?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "X is explained as a concept.");
        assert!(!body["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ask_then_exit_returns_quiz() {
        let quiz = quiz_json();
        let state = state(&["first answer", &quiz]);

        let response = build_router(state.clone())
            .oneshot(json_request("POST", "/ask", serde_json::json!({"query": "What is X?"})))
            .await
            .unwrap();
        let session_id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/ask",
                serde_json::json!({"query": "  Exit ", "session_id": session_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "session ended");
        assert_eq!(body["session_id"], session_id.as_str());
        assert_eq!(body["quiz"].as_array().unwrap().len(), 5);
        assert_eq!(body["quiz"][0]["options"].as_array().unwrap().len(), 4);

        let response = build_router(state)
            .oneshot(empty_request("GET", &format!("/sessions/{session_id}/messages")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_query_is_bad_request() {
        let app = build_router(state(&[]));
        let response = app
            .oneshot(json_request("POST", "/ask", serde_json::json!({"query": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn end_unknown_session_is_not_found() {
        let app = build_router(state(&[]));
        let response = app
            .oneshot(json_request(
                "POST",
                "/end_session",
                serde_json::json!({"session_id": "unknown-id"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("unknown-id"));
    }

    #[tokio::test]
    async fn backend_failure_is_bad_gateway() {
        let app = build_router(state_with(
            vec![Err(ProviderError::ApiError {
                status_code: 500,
                message: "model crashed".into(),
            })],
            true,
        ));
        let response = app
            .oneshot(json_request("POST", "/ask", serde_json::json!({"query": "q"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn retrieval_failure_is_service_unavailable() {
        let app = build_router(state_with(vec![], false));
        let response = app
            .oneshot(json_request("POST", "/ask", serde_json::json!({"query": "q"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn malformed_quiz_is_unprocessable_and_session_survives() {
        let state = state(&["answer", "no quiz here"]);
        let response = build_router(state.clone())
            .oneshot(json_request("POST", "/ask", serde_json::json!({"query": "q"})))
            .await
            .unwrap();
        let session_id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/end_session",
                serde_json::json!({"session_id": session_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = build_router(state)
            .oneshot(empty_request("GET", &format!("/sessions/{session_id}/messages")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn session_crud() {
        let state = state(&[]);

        let response = build_router(state.clone())
            .oneshot(empty_request("POST", "/sessions"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let session_id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = build_router(state.clone())
            .oneshot(empty_request("GET", "/sessions"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["sessions"][0]["session_id"], session_id.as_str());
        assert_eq!(body["sessions"][0]["message_count"], 0);

        let response = build_router(state.clone())
            .oneshot(empty_request("DELETE", &format!("/sessions/{session_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = build_router(state)
            .oneshot(empty_request("DELETE", &format!("/sessions/{session_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_endpoint() {
        let app = build_router(state(&[]));
        let response = app.oneshot(empty_request("GET", "/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["active_sessions"], 0);
        assert_eq!(body["indexed_chunks"], 1);
        assert_eq!(body["model"], "mock-model");
    }

    #[tokio::test]
    async fn cors_allows_any_origin_by_default() {
        let app = build_full_router(state(&[]), &GatewayConfig::default());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ask")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn cors_restricts_to_configured_origins() {
        let config = GatewayConfig {
            allowed_origins: vec!["http://app.example".into()],
            ..GatewayConfig::default()
        };
        let app = build_full_router(state(&[]), &config);
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ask")
            .header("origin", "http://evil.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = GatewayConfig {
            max_body_bytes: 64,
            ..GatewayConfig::default()
        };
        let app = build_full_router(state(&[]), &config);
        let response = app
            .oneshot(json_request(
                "POST",
                "/ask",
                serde_json::json!({"query": "x".repeat(500)}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
