use thiserror::Error;

/// Failures of a single chat exchange.
///
/// Everything except `Unauthorized` on the synchronous endpoint is recoverable by
/// the fallback path; see [`crate::streaming::FallbackReason`].
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("authentication failed (401): {0}")]
    Unauthorized(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("stream ended without completion")]
    Incomplete,

    #[error("malformed done frame: {0}")]
    MalformedDone(#[source] serde_json::Error),

    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stream controller already used (state: {0})")]
    ControllerReused(&'static str),
}

impl ChatError {
    /// True when the server rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, ChatError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ChatError::Network(format!("failed to decode body: {}", err));
        }
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return ChatError::Unauthorized(err.to_string());
            }
            return ChatError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            };
        }
        ChatError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ChatError::Incomplete.to_string(),
            "stream ended without completion"
        );
        let err = ChatError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "server returned 502: bad gateway");
    }

    #[test]
    fn auth_is_distinct_from_transport() {
        assert!(ChatError::Unauthorized("expired".into()).is_auth());
        assert!(!ChatError::Network("reset".into()).is_auth());
        assert!(
            !ChatError::Status {
                status: 403,
                body: String::new()
            }
            .is_auth()
        );
    }
}
