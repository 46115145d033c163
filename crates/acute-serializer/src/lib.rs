//! Pluggable snapshot serialization boundary.
//!
//! The core never inspects a snapshot's contents beyond reading its epoch
//! number during resume; everything else is opaque bytes handed to and
//! from the caller's own checkpoint representation `S`. This mirrors the
//! two-operation dependency spelled out for the serializer collaborator:
//! `serialize` and `read_epoch`.

mod error;

pub use error::SerializerError;

/// A checkpointable training state. The only thing the core needs to know
/// about it is which training epoch it was taken at.
pub trait Checkpoint {
    fn epoch(&self) -> u64;
}

/// Converts a checkpoint to and from bytes for transport and durable
/// storage. Implementations are expected to be cheap to clone/share (no
/// interior state beyond configuration).
pub trait Serializer<S>: Send + Sync
where
    S: Checkpoint,
{
    /// Serialize the whole checkpoint to bytes. The Copier slices the
    /// result per shard range; this call itself does no sharding.
    fn serialize(&self, checkpoint: &S) -> Result<Vec<u8>, SerializerError>;

    /// Read back just the `epoch` field of a previously serialized
    /// checkpoint, without reconstructing the full value. Used only at
    /// resume time to decide where the save-count schedule picks back up.
    fn read_epoch(&self, bytes: &[u8]) -> Result<u64, SerializerError>;
}

/// Reference `Serializer` built on `bincode` for compact binary framing.
pub struct BincodeSerializer;

impl<S> Serializer<S> for BincodeSerializer
where
    S: Checkpoint + serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, checkpoint: &S) -> Result<Vec<u8>, SerializerError> {
        bincode::serialize(checkpoint).map_err(SerializerError::Encode)
    }

    fn read_epoch(&self, bytes: &[u8]) -> Result<u64, SerializerError> {
        let checkpoint: S = bincode::deserialize(bytes).map_err(SerializerError::Decode)?;
        Ok(checkpoint.epoch())
    }
}

/// Convenience free function for the common case where the caller already
/// has a concrete `Serializer` and just wants the epoch of some bytes read
/// off disk (the resume path in `acute_core::init`).
pub fn read_epoch<S, Ser>(serializer: &Ser, bytes: &[u8]) -> Result<u64, SerializerError>
where
    S: Checkpoint,
    Ser: Serializer<S>,
{
    serializer.read_epoch(bytes)
}
