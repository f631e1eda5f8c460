use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::critique::error::CritiqueError;

pub const DEFAULT_USER_GOAL: &str = "General Feedback";

/// `user_goal` and `lens` are kept as raw JSON: a value of the wrong type
/// degrades to a default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CritiqueRequest {
    #[serde(default)]
    pub user_goal: Option<Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lens: Option<Value>,
}

impl CritiqueRequest {
    /// An absent body is treated as an empty JSON object.
    pub fn parse(body: Option<&str>) -> Result<Self, CritiqueError> {
        let raw = body.unwrap_or("{}");
        serde_json::from_str(raw).map_err(CritiqueError::InvalidInput)
    }

    /// Non-string goals are rendered as their JSON text.
    pub fn user_goal(&self) -> Cow<'_, str> {
        match &self.user_goal {
            None | Some(Value::Null) => Cow::Borrowed(DEFAULT_USER_GOAL),
            Some(Value::String(goal)) => Cow::Borrowed(goal.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }

    pub fn lens_id(&self) -> Option<&str> {
        self.lens.as_ref().and_then(Value::as_str)
    }

    /// Forwarded as given; whitespace only counts for the emptiness check.
    pub fn image_url(&self) -> Result<&str, CritiqueError> {
        match self.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(CritiqueError::MissingImage),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CritiqueReply {
    pub critique: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorReply {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorReply {
            error: error.into(),
            details: None,
            raw: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}
