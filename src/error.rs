//! Error types for the otama binding.
//!
//! All failures surface through the [`OtamaError`] enum. Engine failures carry
//! the name of the operation that produced them together with the engine's own
//! status text, so callers can diagnose without string matching or inspecting
//! internal state.

use thiserror::Error;

/// The main error type for otama operations.
#[derive(Error, Debug)]
pub enum OtamaError {
    /// An operation was attempted while the session was not open.
    ///
    /// This is a programming error on the caller's side; the native engine is
    /// never called when it occurs.
    #[error("{operation}: session is {state}, expected open")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The session state at the time of the call.
        state: &'static str,
    },

    /// Malformed identifier text or wrong-width identifier bytes.
    #[error("codec error: {0}")]
    Codec(String),

    /// Variant decoding hit an unsupported shape or exceeded the depth bound.
    #[error("decode error: {0}")]
    Decode(String),

    /// The engine reported a non-success status code.
    ///
    /// `message` is the engine's own status text, never synthesized here.
    #[error("{operation}: {message}")]
    Engine {
        /// The session operation that called into the engine.
        operation: &'static str,
        /// The engine's human-readable status text.
        message: String,
    },
}

/// Result type alias for operations that may fail with [`OtamaError`].
pub type Result<T> = std::result::Result<T, OtamaError>;

impl OtamaError {
    /// Create a new invalid-state error.
    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        OtamaError::InvalidState { operation, state }
    }

    /// Create a new codec error.
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        OtamaError::Codec(msg.into())
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        OtamaError::Decode(msg.into())
    }

    /// Create a new engine error from an operation name and engine status text.
    pub fn engine<S: Into<String>>(operation: &'static str, message: S) -> Self {
        OtamaError::Engine {
            operation,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = OtamaError::engine("search", "no data available");
        assert_eq!(err.to_string(), "search: no data available");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = OtamaError::invalid_state("insert", "closed");
        assert_eq!(err.to_string(), "insert: session is closed, expected open");
    }
}
