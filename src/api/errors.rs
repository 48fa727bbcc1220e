//! REST client error types

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Failed to decode {resource} response: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid API URL '{0}'")]
    InvalidUrl(String),
}

impl ApiError {
    /// Message supplied by the backend in the error body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to show the operator: the server message when present, otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Pull `message` out of an error body. Validation errors arrive as an array
/// of strings, everything else as a single string.
pub fn extract_server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("\n"))
            }
        }
        _ => None,
    }
}
