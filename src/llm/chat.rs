use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::utils::http::chat_completion_request;
use crate::utils::logging::truncate_for_log;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("AI API Error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("AI Provider returned empty choices.")]
    EmptyResponse { raw: Value },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    /// True when the provider answered but the answer was unusable.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            UpstreamError::Status { .. } | UpstreamError::EmptyResponse { .. }
        )
    }
}

pub struct CritiquePrompt<'a> {
    pub system_prompt: &'a str,
    pub user_goal: &'a str,
    pub image_url: &'a str,
}

pub fn build_payload(config: &Config, prompt: &CritiquePrompt<'_>) -> Value {
    json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": prompt.system_prompt },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": format!("User Goal: {}", prompt.user_goal) },
                    { "type": "image_url", "image_url": { "url": prompt.image_url } }
                ]
            }
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    })
}

/// Text of the first choice. String content is returned verbatim; content
/// given as a list of parts is joined from its text parts.
pub fn extract_message_content(response: &Value) -> Option<String> {
    let content = response.pointer("/choices/0/message/content")?;
    let text = match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|v| v.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => return None,
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

async fn call_chat_completion_api(
    config: &Config,
    api_key: &str,
    payload: &Value,
) -> Result<Value, UpstreamError> {
    debug!(
        "Chat completion request: url={}, model={}",
        config.api_url, config.model
    );

    let response = chat_completion_request(config, api_key)
        .json(payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        warn!(
            "Upstream API error: status={}, body={}",
            status,
            truncate_for_log(&body, 2000)
        );
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

pub async fn request_critique(
    config: &Config,
    api_key: &str,
    prompt: &CritiquePrompt<'_>,
) -> Result<String, UpstreamError> {
    let payload = build_payload(config, prompt);

    log_llm_timing(&config.model, "critique", || async {
        let response = call_chat_completion_api(config, api_key, &payload).await?;
        match extract_message_content(&response) {
            Some(text) => Ok(text),
            None => {
                warn!(
                    "Upstream response had no usable content: {}",
                    truncate_for_log(&response.to_string(), 2000)
                );
                Err(UpstreamError::EmptyResponse { raw: response })
            }
        }
    })
    .await
}
