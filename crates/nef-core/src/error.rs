use thiserror::Error;

/// Core error types for decoding and classifying core-network state
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown core network event: {0}")]
    UnknownEvent(String),

    #[error("Malformed UE state: {0}")]
    MalformedState(String),

    #[error("Malformed {event} payload: {message}")]
    MalformedPayload { event: String, message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl CoreError {
    pub fn unknown_event(event: impl Into<String>) -> Self {
        Self::UnknownEvent(event.into())
    }

    pub fn malformed_state(message: impl Into<String>) -> Self {
        Self::MalformedState(message.into())
    }

    pub fn malformed_payload(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            event: event.into(),
            message: message.into(),
        }
    }

    /// Errors caused by what a producer put on the bus rather than by this process
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEvent(_)
                | Self::MalformedState(_)
                | Self::MalformedPayload { .. }
                | Self::JsonError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_errors_name_the_event() {
        let err = CoreError::malformed_payload("LOCATION_REPORT", "missing field `TimeStamp`");
        assert_eq!(
            err.to_string(),
            "Malformed LOCATION_REPORT payload: missing field `TimeStamp`"
        );
        assert!(err.is_input_error());
        assert!(!CoreError::InvalidTimestamp(-1).is_input_error());
    }
}
