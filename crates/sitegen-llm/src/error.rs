//! Errors from model calls and their retry classification.

/// Lower-cased fragments of transient network failures as they appear in
/// error messages from the HTTP stack and upstream proxies.
const TRANSIENT_SIGNATURES: &[&str] = &[
    "econnreset",
    "econnrefused",
    "etimedout",
    "epipe",
    "eai_again",
    "socket hang up",
    "connection reset",
    "connection closed",
    "connection refused",
    "broken pipe",
    "timed out",
    "error sending request",
    "unexpected eof",
];

/// Errors from LLM provider calls.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model provider not configured: {0}")]
    Config(String),
    #[error("HTTP transport error: {0}")]
    Transport(String),
    #[error("model request timed out")]
    Timeout,
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("empty response from model")]
    EmptyResponse,
    #[error("model call failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ModelError>,
    },
}

impl ModelError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Rate limits, 5xx responses, "overloaded" reports, timeouts, and known
    /// transient network signatures qualify. Everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Api { status, message } => {
                *status == 429
                    || (500..=599).contains(status)
                    || message.to_ascii_lowercase().contains("overloaded")
            }
            Self::Transport(message) => {
                let lower = message.to_ascii_lowercase();
                lower.contains("overloaded")
                    || TRANSIENT_SIGNATURES.iter().any(|sig| lower.contains(sig))
            }
            Self::Config(_) | Self::Parse(_) | Self::EmptyResponse | Self::RetriesExhausted { .. } => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_decode() {
            return Self::Parse(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Api {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        // reqwest's Display hides the io cause; include the chain so the
        // transient signatures above can match it.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> ModelError {
        ModelError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(api(429, "slow down").is_retryable());
        assert!(api(500, "internal").is_retryable());
        assert!(api(503, "unavailable").is_retryable());
        assert!(api(529, "Overloaded").is_retryable());
        assert!(api(400, "Overloaded, try later").is_retryable());
    }

    #[test]
    fn test_fatal_statuses() {
        assert!(!api(400, "invalid max_tokens").is_retryable());
        assert!(!api(401, "bad key").is_retryable());
        assert!(!api(404, "no such model").is_retryable());
    }

    #[test]
    fn test_transport_signatures() {
        assert!(ModelError::Transport("read ECONNRESET".into()).is_retryable());
        assert!(ModelError::Transport("socket hang up".into()).is_retryable());
        assert!(ModelError::Transport("operation timed out".into()).is_retryable());
        assert!(!ModelError::Transport("invalid certificate".into()).is_retryable());
    }

    #[test]
    fn test_other_errors_are_fatal() {
        assert!(ModelError::Timeout.is_retryable());
        assert!(!ModelError::Parse("bad json".into()).is_retryable());
        assert!(!ModelError::EmptyResponse.is_retryable());
        assert!(!ModelError::Config("no key".into()).is_retryable());
        let exhausted = ModelError::RetriesExhausted {
            attempts: 4,
            last: Box::new(api(503, "down")),
        };
        assert!(!exhausted.is_retryable());
        assert!(exhausted.to_string().contains("4 attempts"));
    }
}
