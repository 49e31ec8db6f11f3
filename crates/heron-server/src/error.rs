//! Transport errors.

use thiserror::Error;

/// Errors that stop the server.
///
/// Request-level failures never surface here; the dispatcher turns them into
/// responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address did not parse or could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Configured address.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the listening socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub(crate) fn bind(addr: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Self::Bind {
            addr: addr.into(),
            source: source.into(),
        }
    }
}
