//! Error type shared by the API client and the aggregator

use thiserror::Error;

/// Anything that can go wrong talking to the telemetry API.
///
/// Every variant means the same thing to a poll: the cycle is discarded and
/// previously displayed data stays in place. The variants only exist so logs
/// and the UI can say *why*.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed JSON: {0}")]
    Decode(String),

    #[error("unexpected payload shape: {0}")]
    Format(String),
}

impl ApiError {
    /// Text suitable for inline display in the command panel.
    ///
    /// The command endpoints answer failures with a plain-text body, which is
    /// what the user wants to read.
    pub fn display_body(&self) -> String {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => body.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_is_shown_verbatim() {
        let err = ApiError::Status {
            status: 500,
            body: "system offline\n".to_string(),
        };
        assert_eq!(err.display_body(), "system offline");
    }

    #[test]
    fn empty_status_body_falls_back_to_message() {
        let err = ApiError::Status {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.display_body(), "server returned 404: ");
    }
}
