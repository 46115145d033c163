use thiserror::Error;

/// Failures surfaced by a [`crate::Transport`] implementation.
///
/// A small, closed enum with `#[from]` wiring for the one external cause
/// (`std::io::Error`) that can legitimately originate below the transport
/// boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer at rank {rank} is unreachable: {reason}")]
    PeerUnreachable { rank: i32, reason: String },

    #[error("message framing violated: expected {expected} bytes, got {got}")]
    FrameMismatch { expected: u64, got: u64 },

    #[error("transport already shut down")]
    Closed,

    #[error("failed to encode/decode an object message: {0}")]
    ObjectCodec(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether a caller might reasonably retry the operation (teacher's
    /// `StreamError::is_recoverable` pattern, applied to the transport
    /// boundary instead of the ring).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::Io(_))
    }

    #[must_use]
    pub fn encode_failed(err: impl std::fmt::Display) -> Self {
        TransportError::ObjectCodec(err.to_string())
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_recoverable()
    }
}
