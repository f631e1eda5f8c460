use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::{Config, API_KEY_ENV};
use crate::critique::error::{INTERNAL_ERROR_DETAILS, INTERNAL_ERROR_MESSAGE};
use crate::critique::{CritiqueError, CritiqueReply, CritiqueRequest, ErrorReply, Lens};
use crate::llm::{request_critique, CritiquePrompt, UpstreamError};
use crate::utils::logging::truncate_for_log;
use crate::utils::timing::{complete_invocation_timer, start_invocation_timer};

const DETAIL_LOG_LIMIT: usize = 300;

/// HTTP-trigger event handed to the function by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl InvocationEvent {
    pub fn new(http_method: impl Into<String>, body: Option<String>) -> Self {
        InvocationEvent {
            http_method: http_method.into(),
            body,
        }
    }

    fn is_preflight(&self) -> bool {
        self.http_method.trim().eq_ignore_ascii_case("OPTIONS")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl InvocationResponse {
    fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        let body = serde_json::to_string(payload).unwrap_or_else(|err| {
            error!("Failed to serialize response body: {err}");
            r#"{"error":"Internal Server Error"}"#.to_string()
        });
        InvocationResponse {
            status_code,
            headers: cors_headers(),
            body,
        }
    }

    fn no_content() -> Self {
        InvocationResponse {
            status_code: 204,
            headers: cors_headers(),
            body: String::new(),
        }
    }

    pub fn internal_error() -> Self {
        InvocationResponse::json(
            500,
            &ErrorReply::new(INTERNAL_ERROR_MESSAGE).with_details(INTERNAL_ERROR_DETAILS),
        )
    }
}

pub fn cors_headers() -> BTreeMap<String, String> {
    [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Headers", "Content-Type"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

pub async fn handle_event(config: &Config, event: InvocationEvent) -> InvocationResponse {
    let mut timer = start_invocation_timer(&event.http_method);

    if event.is_preflight() {
        complete_invocation_timer(&mut timer, 204, None);
        return InvocationResponse::no_content();
    }

    let response = match run_critique(config, event.body.as_deref()).await {
        Ok(critique) => InvocationResponse::json(200, &CritiqueReply { critique }),
        Err(err) => {
            log_failure(&err);
            InvocationResponse::json(err.status_code(), &err.to_reply())
        }
    };

    let detail =
        (response.status_code != 200).then(|| truncate_for_log(&response.body, DETAIL_LOG_LIMIT));
    complete_invocation_timer(&mut timer, response.status_code, detail);
    response
}

async fn run_critique(config: &Config, body: Option<&str>) -> Result<String, CritiqueError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or(CritiqueError::MissingApiKey(API_KEY_ENV))?;

    let request = CritiqueRequest::parse(body)?;
    let image_url = request.image_url()?;
    let lens = Lens::resolve(request.lens_id());
    if let Some(requested) = &request.lens {
        if request.lens_id().and_then(Lens::from_id).is_none() {
            info!("Unknown lens {}, falling back to {}", requested, lens);
        }
    }

    let user_goal = request.user_goal();
    info!(
        "Analyzing design for goal: {} with lens: {}",
        user_goal, lens
    );

    let system_prompt = lens.system_prompt();
    let prompt = CritiquePrompt {
        system_prompt: &system_prompt,
        user_goal: &user_goal,
        image_url,
    };
    Ok(request_critique(config, api_key, &prompt).await?)
}

fn log_failure(err: &CritiqueError) {
    match err {
        CritiqueError::MissingApiKey(name) => error!("{} is not configured", name),
        CritiqueError::InvalidInput(cause) => warn!("Rejected request body: {}", cause),
        CritiqueError::MissingImage => warn!("Rejected request without image_url"),
        CritiqueError::Upstream(UpstreamError::Status { status, .. }) => {
            warn!("Upstream returned status {}", status)
        }
        CritiqueError::Upstream(UpstreamError::EmptyResponse { .. }) => {
            warn!("Upstream returned no usable choice")
        }
        CritiqueError::Upstream(cause) => error!("Internal Crash: {:?}", cause),
        CritiqueError::Internal(cause) => error!("Internal Crash: {:?}", cause),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use super::*;
    use crate::config::{test_config, BASE_SYSTEM_PROMPT};
    use crate::critique::lens::LENS_SEPARATOR;
    use crate::critique::types::DEFAULT_USER_GOAL;
    use crate::llm::fake_upstream::{unreachable_url, FakeUpstream};

    fn post(body: &str) -> InvocationEvent {
        InvocationEvent::new("POST", Some(body.to_string()))
    }

    fn body_json(response: &InvocationResponse) -> Value {
        serde_json::from_str(&response.body).expect("json body")
    }

    fn assert_cors(response: &InvocationResponse) {
        assert_eq!(response.headers, cors_headers());
    }

    async fn ok_upstream(content: &str) -> FakeUpstream {
        FakeUpstream::spawn(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
                .to_string(),
        )
        .await
    }

    #[tokio::test]
    async fn preflight_returns_no_content_even_without_api_key() {
        let mut config = test_config("http://unused");
        config.api_key = None;

        let response = handle_event(&config, InvocationEvent::new("OPTIONS", None)).await;

        assert_eq!(response.status_code, 204);
        assert!(response.body.is_empty());
        assert_cors(&response);
        assert_eq!(
            response.headers.get("Access-Control-Allow-Methods").map(String::as_str),
            Some("POST, OPTIONS")
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_checked_before_input() {
        let mut config = test_config("http://unused");
        config.api_key = None;

        let response = handle_event(&config, post("not json")).await;

        assert_eq!(response.status_code, 500);
        assert_cors(&response);
        assert!(body_json(&response)["error"]
            .as_str()
            .expect("error text")
            .contains("SCW_SECRET_KEY"));
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let config = test_config("http://unused");
        for body in ["{", "nope", "[]"] {
            let response = handle_event(&config, post(body)).await;
            assert_eq!(response.status_code, 400, "body {body:?}");
            assert_eq!(body_json(&response)["error"], "Invalid JSON input");
            assert_cors(&response);
        }
    }

    #[tokio::test]
    async fn missing_or_empty_image_is_rejected() {
        let config = test_config("http://unused");
        for body in [
            r#"{"user_goal":"Buy","lens":"roast"}"#,
            r#"{"image_url":""}"#,
            r#"{"image_url":null,"lens":"visual"}"#,
        ] {
            let response = handle_event(&config, post(body)).await;
            assert_eq!(response.status_code, 400, "body {body:?}");
            assert_eq!(body_json(&response)["error"], "No image URL or data provided.");
            assert_cors(&response);
        }

        let response = handle_event(&config, InvocationEvent::new("POST", None)).await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn known_lens_is_appended_after_base_prompt() {
        let upstream = ok_upstream("fine").await;
        let config = test_config(&upstream.url);

        let response = handle_event(
            &config,
            post(r#"{"user_goal":"Sign up","image_url":"https://x/a.png","lens":"conversion"}"#),
        )
        .await;

        assert_eq!(response.status_code, 200);
        let requests = upstream.requests();
        let system = requests[0].payload["messages"][0]["content"]
            .as_str()
            .expect("system prompt")
            .to_string();
        assert!(system.starts_with(BASE_SYSTEM_PROMPT));
        assert!(system.ends_with(Lens::Conversion.instruction()));
        assert_eq!(
            system,
            format!(
                "{}{}{}",
                BASE_SYSTEM_PROMPT,
                LENS_SEPARATOR,
                Lens::Conversion.instruction()
            )
        );
        assert_eq!(
            requests[0].payload["messages"][1]["content"][0]["text"],
            "User Goal: Sign up"
        );
    }

    #[tokio::test]
    async fn unknown_lens_and_missing_goal_fall_back_to_defaults() {
        let upstream = ok_upstream("fine").await;
        let config = test_config(&upstream.url);

        let response = handle_event(
            &config,
            post(r#"{"image_url":"https://x/a.png","lens":"vaporwave"}"#),
        )
        .await;

        assert_eq!(response.status_code, 200);
        let payload = &upstream.requests()[0].payload;
        assert_eq!(
            payload["messages"][0]["content"],
            Lens::UxClarity.system_prompt()
        );
        assert_eq!(
            payload["messages"][1]["content"][0]["text"],
            format!("User Goal: {DEFAULT_USER_GOAL}")
        );
        assert_eq!(
            payload["messages"][1]["content"][1]["image_url"]["url"],
            "https://x/a.png"
        );
    }

    #[tokio::test]
    async fn non_string_lens_and_goal_fall_back_instead_of_failing() {
        for (body, goal) in [
            (r#"{"image_url":"https://x/a.png","lens":7}"#, DEFAULT_USER_GOAL),
            (r#"{"image_url":"https://x/a.png","lens":["roast"]}"#, DEFAULT_USER_GOAL),
            (r#"{"image_url":"https://x/a.png","user_goal":42}"#, "42"),
        ] {
            let upstream = ok_upstream("fine").await;
            let config = test_config(&upstream.url);

            let response = handle_event(&config, post(body)).await;

            assert_eq!(response.status_code, 200, "body {body:?}");
            let payload = &upstream.requests()[0].payload;
            assert_eq!(
                payload["messages"][0]["content"],
                Lens::UxClarity.system_prompt()
            );
            assert_eq!(
                payload["messages"][1]["content"][0]["text"],
                format!("User Goal: {goal}")
            );
        }
    }

    #[tokio::test]
    async fn image_url_is_forwarded_unchanged() {
        let upstream = ok_upstream("fine").await;
        let config = test_config(&upstream.url);

        let response =
            handle_event(&config, post(r#"{"image_url":"  https://x/a.png  "}"#)).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            upstream.requests()[0].payload["messages"][1]["content"][1]["image_url"]["url"],
            "  https://x/a.png  "
        );
    }

    #[tokio::test]
    async fn successful_choice_is_returned_verbatim() {
        let critique = "### 🎯 First Impression\nBusy, but <span style=\"color: #D0BCFF\">bold</span>.\n";
        let upstream = ok_upstream(critique).await;
        let config = test_config(&upstream.url);

        let response = handle_event(&config, post(r#"{"image_url":"https://x/a.png"}"#)).await;

        assert_eq!(response.status_code, 200);
        assert_cors(&response);
        let reply: CritiqueReply = serde_json::from_str(&response.body).expect("reply");
        assert_eq!(reply.critique, critique);
    }

    #[tokio::test]
    async fn upstream_rate_limit_maps_to_bad_gateway() {
        let upstream =
            FakeUpstream::spawn(StatusCode::TOO_MANY_REQUESTS, r#"{"message":"slow"}"#.into())
                .await;
        let config = test_config(&upstream.url);

        let response = handle_event(&config, post(r#"{"image_url":"https://x/a.png"}"#)).await;

        assert_eq!(response.status_code, 502);
        assert_cors(&response);
        let error = body_json(&response)["error"].as_str().expect("error").to_string();
        assert!(error.contains("429"));
        assert!(error.contains("slow"));
    }

    #[tokio::test]
    async fn empty_choices_map_to_bad_gateway_with_raw_payload() {
        let raw = json!({"id": "cmpl-1", "choices": []});
        let upstream = FakeUpstream::spawn(StatusCode::OK, raw.to_string()).await;
        let config = test_config(&upstream.url);

        let response = handle_event(&config, post(r#"{"image_url":"https://x/a.png"}"#)).await;

        assert_eq!(response.status_code, 502);
        assert_cors(&response);
        let body = body_json(&response);
        assert_eq!(body["error"], "AI Provider returned empty choices.");
        assert_eq!(body["raw"], raw);
    }

    #[tokio::test]
    async fn transport_failure_is_an_opaque_internal_error() {
        let config = test_config(&unreachable_url().await);

        let response = handle_event(&config, post(r#"{"image_url":"https://x/a.png"}"#)).await;

        assert_eq!(response.status_code, 500);
        assert_cors(&response);
        let reply: ErrorReply = serde_json::from_str(&response.body).expect("reply");
        assert_eq!(reply.error, "Internal Server Error");
        assert_eq!(reply.details.as_deref(), Some("Check function logs"));
    }

    #[test]
    fn event_deserializes_from_platform_shape() {
        let event: InvocationEvent =
            serde_json::from_str(r#"{"httpMethod":"POST","body":"{}"}"#).expect("event");
        assert_eq!(event.http_method, "POST");
        assert_eq!(event.body.as_deref(), Some("{}"));

        let event: InvocationEvent =
            serde_json::from_str(r#"{"httpMethod":"options"}"#).expect("event");
        assert!(event.is_preflight());
    }
}
