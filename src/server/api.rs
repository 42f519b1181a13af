use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::{ header::CONTENT_TYPE, Method, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use serde_json::{ json, Value as JsonValue };
use tower_http::cors::{ AllowOrigin, Any, CorsLayer };

use crate::agent::PortfolioAgent;
use crate::config::CorsOrigins;
use crate::error::ChatError;

pub const MALFORMED_BODY: &str = "Invalid request: malformed JSON body";

#[derive(Clone)]
struct AppState {
    agent: Arc<PortfolioAgent>,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.response_body())).into_response()
    }
}

pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) => AllowOrigin::list(list.clone()),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

/// Chat and health routes. `/chat` is also served under the historical `/api` prefix.
pub fn router(agent: Arc<PortfolioAgent>, origins: &CorsOrigins) -> Router {
    let app_state = AppState { agent };

    Router::new()
        .route("/", get(root_health_handler))
        .route("/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/api/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/chat/health", get(chat_health_handler))
        .route("/api/chat/health", get(chat_health_handler))
        .layer(cors_layer(origins))
        .with_state(app_state)
}

/// Decodes the body leniently: an empty body counts as `{}` so it fails validation
/// with the usual message instead of a parse error.
fn parse_body(body: &[u8]) -> Result<JsonValue, ChatError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| ChatError::invalid_request(MALFORMED_BODY))
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = match parse_body(&body) {
        Ok(value) => state.agent.handle_chat(&value).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn chat_health_handler() -> Json<JsonValue> {
    Json(json!({ "status": "ok", "message": "Chat service is running" }))
}

async fn root_health_handler() -> Json<JsonValue> {
    Json(json!({ "status": "ok", "message": "Portfolio chatbot API is running" }))
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method not allowed" }))).into_response()
}
