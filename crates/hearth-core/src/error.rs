// ── Core error types ──
//
// `DomainError` is what the backing domain collaborator reports from its
// command functions. `CoreError` is what the runtime surfaces to callers.
// Cancellation is never modelled as an error.

use thiserror::Error;

/// Failure reported by a backing domain command.
///
/// Cloneable and comparable so it can travel inside store events and be
/// asserted on in reducer tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Gateway is not connected")]
    NotConnected,

    #[error("Request rejected by gateway: {message}")]
    Rejected { message: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Store '{store}' is no longer running")]
    StoreClosed { store: &'static str },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid fixture data: {message}")]
    Fixture { message: String },
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Fixture {
            message: err.to_string(),
        }
    }
}
