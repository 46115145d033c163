use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode checkpoint: {0}")]
    Decode(#[source] bincode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
