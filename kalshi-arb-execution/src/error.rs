use thiserror::Error;

/// Errors surfaced by a [`KalshiTransport`](crate::KalshiTransport).
///
/// The opportunity engine never inspects the variant to decide control flow; every transport
/// failure degrades the same way. Variants exist for logging & diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("rate limited by venue, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
