//! In-process chat-completion server used by tests.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub payload: Value,
}

#[derive(Clone)]
struct FakeState {
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
    body: String,
}

pub struct FakeUpstream {
    pub url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeUpstream {
    /// Every request is answered with `status` and `body`.
    pub async fn spawn(status: StatusCode, body: String) -> FakeUpstream {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            captured: captured.clone(),
            status,
            body,
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(reply))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("fake upstream address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake upstream");
        });

        FakeUpstream {
            url: format!("http://{addr}/v1/chat/completions"),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().expect("captured lock").clone()
    }
}

/// Address nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}/v1/chat/completions")
}

async fn reply(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .captured
        .lock()
        .expect("captured lock")
        .push(CapturedRequest {
            authorization,
            payload,
        });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}
