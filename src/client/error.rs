use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("session expired; sign in again")]
    SessionExpired,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("server responded with {status}: {}", status_detail(.message, .body))]
    Status {
        status: StatusCode,
        body: String,
        /// The `error`/`message` string of a JSON error envelope, when present.
        message: Option<String>,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API base URL `{0}` cannot carry path segments")]
    BaseUrl(String),
    #[error("invalid header value: {0}")]
    Header(String),
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

fn status_detail<'a>(message: &'a Option<String>, body: &'a str) -> &'a str {
    message.as_deref().unwrap_or(body)
}

impl ClientError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}
