use thiserror::Error;

use acute_serializer::SerializerError;
use acute_transport::TransportError;

use crate::config::ConfigError;

/// Failures a training-collective collaborator can raise from `init`.
#[derive(Debug, Error)]
pub enum CollectiveError {
    #[error("process group init failed: {0}")]
    InitFailed(String),
}

/// Violations of the protocol this crate expects from its own worker
/// threads — not operator error (`ConfigError`) and not a lower-layer
/// failure (`TransportError`/`SerializerError`/IO), but an invariant this
/// crate itself is responsible for upholding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("received data from unexpected shard rank {got}, expected {expected}")]
    UnexpectedShardRank { expected: usize, got: usize },

    #[error("remote buffer slot {slot} was not clean when claimed")]
    DirtySlotClaimed { slot: usize },

    #[error("save() called before start(): no worker thread is running to pick it up")]
    NotStarted,

    #[error("start()/run() called twice on the same node")]
    AlreadyStarted,

    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),
}

/// The umbrella error type every public entry point in this crate returns.
/// Every row of the error-handling table maps to exactly one variant here
/// (directly, or via one of the wrapped causes).
#[derive(Debug, Error)]
pub enum AcuteError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Serializer(#[from] SerializerError),

    #[error(transparent)]
    Collective(#[from] CollectiveError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AcuteError {
    /// Whether the failure is the kind an operator can fix and retry
    /// (bad config, unreachable peer) versus a fail-fast bug class.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            AcuteError::Config(_) => true,
            AcuteError::Transport(e) => e.is_recoverable(),
            AcuteError::Io(_) => true,
            AcuteError::Serializer(_) | AcuteError::Collective(_) | AcuteError::Protocol(_) => {
                false
            }
        }
    }
}
