use thiserror::Error;

use crate::critique::types::ErrorReply;
use crate::llm::chat::UpstreamError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";
pub const INTERNAL_ERROR_DETAILS: &str = "Check function logs";

#[derive(Debug, Error)]
pub enum CritiqueError {
    #[error("CRITICAL: {0} env var is missing.")]
    MissingApiKey(&'static str),
    #[error("Invalid JSON input")]
    InvalidInput(#[source] serde_json::Error),
    #[error("No image URL or data provided.")]
    MissingImage,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Internal Server Error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CritiqueError {
    pub fn status_code(&self) -> u16 {
        match self {
            CritiqueError::MissingApiKey(_) => 500,
            CritiqueError::InvalidInput(_) | CritiqueError::MissingImage => 400,
            CritiqueError::Upstream(err) if err.is_upstream_failure() => 502,
            CritiqueError::Upstream(_) | CritiqueError::Internal(_) => 500,
        }
    }

    /// Client-visible payload. Internal failures expose only a short message.
    pub fn to_reply(&self) -> ErrorReply {
        match self {
            CritiqueError::Upstream(UpstreamError::EmptyResponse { raw }) => {
                ErrorReply::new(self.to_string()).with_raw(raw.clone())
            }
            CritiqueError::Upstream(err) if err.is_upstream_failure() => {
                ErrorReply::new(self.to_string())
            }
            CritiqueError::Upstream(_) | CritiqueError::Internal(_) => {
                ErrorReply::new(INTERNAL_ERROR_MESSAGE).with_details(INTERNAL_ERROR_DETAILS)
            }
            _ => ErrorReply::new(self.to_string()),
        }
    }
}
