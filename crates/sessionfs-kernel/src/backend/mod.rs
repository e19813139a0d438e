//! Backend collaborators.
//!
//! A backend turns the text a client wrote to a session's `input` into a
//! reply. The registry calls it synchronously on every close of `input`
//! and folds the result into the session's `output` or `error` file.

mod command;
mod echo;
mod reject;

pub use command::CommandBackend;
pub use echo::EchoBackend;
pub use reject::RejectBackend;

use std::io;
use std::string::FromUtf8Error;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a backend.
///
/// Never surfaces as a filesystem error; it becomes `error` file content.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend ran and refused or failed the request.
    #[error("{0}")]
    Failed(String),

    /// The backend did not answer within its deadline.
    #[error("backend timed out after {0:?}")]
    TimedOut(Duration),

    /// The backend process could not be started.
    #[error("failed to start backend: {0}")]
    Spawn(#[source] io::Error),

    /// I/O with the backend failed.
    #[error("backend I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backend replied with bytes that are not UTF-8.
    #[error("backend reply is not valid UTF-8: {0}")]
    InvalidOutput(#[from] FromUtf8Error),
}

impl BackendError {
    /// Create a Failed error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Opaque request → reply computation.
///
/// Implementations must be callable from several threads at once; the
/// registry only serializes calls for the same session.
pub trait Backend: Send + Sync {
    /// Produce a reply for `request`, blocking until it is available.
    fn respond(&self, request: &str) -> Result<String, BackendError>;
}

impl<F> Backend for F
where
    F: Fn(&str) -> Result<String, BackendError> + Send + Sync,
{
    fn respond(&self, request: &str) -> Result<String, BackendError> {
        self(request)
    }
}
