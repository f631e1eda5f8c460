use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::config::Config;

const USER_AGENT: &str = concat!("design-critic/", env!("CARGO_PKG_VERSION"));

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}

/// POST to the configured chat-completion endpoint, authenticated and bounded
/// by the configured upstream timeout. The caller attaches the JSON body.
pub fn chat_completion_request(config: &Config, api_key: &str) -> RequestBuilder {
    get_http_client()
        .post(&config.api_url)
        .bearer_auth(api_key)
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/json")
        .timeout(Duration::from_secs(config.upstream_timeout_seconds))
}
