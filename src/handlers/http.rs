use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::Config;
use crate::handlers::critique::{handle_event, InvocationEvent, InvocationResponse};

/// Screenshots may arrive inline as data URLs.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn create_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", any(invoke))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

async fn invoke(State(config): State<Arc<Config>>, method: Method, body: Bytes) -> Response {
    let body = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&body).into_owned())
    };
    let event = InvocationEvent::new(method.as_str(), body);
    handle_event(&config, event).await.into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Internal Crash: handler panicked: {}", detail);
    InvocationResponse::internal_error().into_response()
}

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        let InvocationResponse {
            status_code,
            headers,
            body,
        } = self;
        let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, body).into_response();
        let response_headers = response.headers_mut();
        for (name, value) in &headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response_headers.insert(name, value);
                }
                _ => error!("Dropping invalid response header {}", name),
            }
        }
        response
    }
}
