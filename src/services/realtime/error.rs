use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure on a realtime socket (bad frame, send failure, closed channel).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct WebSocketError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl WebSocketError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_underlying_cause() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = WebSocketError::with_source("invalid location frame", cause);

        assert_eq!(err.to_string(), "invalid location frame");
        assert!(err.source().is_some());
    }

    #[test]
    fn plain_error_has_no_cause() {
        let err = WebSocketError::new("socket closed");
        assert_eq!(err.message(), "socket closed");
        assert!(err.source().is_none());
    }
}
