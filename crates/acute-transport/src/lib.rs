//! MPI transport wrapper.
//!
//! `Transport` is the one abstraction the rest of ACUTE depends on for
//! cross-rank communication: point-to-point send/recv and the single
//! all-gather used during role election. Everything else (serialization,
//! scheduling, durability) lives above this crate.

pub mod error;
pub mod fake;
pub mod framing;

#[cfg(feature = "mpi-real")]
pub mod mpi_transport;

pub use error::TransportError;
pub use fake::{FakeNetwork, FakeTransport};
#[cfg(feature = "mpi-real")]
pub use mpi_transport::MpiTransport;

/// The point-to-point and all-gather primitives ACUTE's core depends on.
///
/// One real implementation (`MpiTransport`, behind the `mpi-real` feature)
/// wraps the `mpi` crate directly; `FakeTransport` is an in-process stand-in
/// for tests and the demo binary.
pub trait Transport: Send + Sync {
    /// This process's rank within the world communicator.
    fn rank(&self) -> i32;

    /// Total number of ranks in the world communicator.
    fn size(&self) -> i32;

    /// Hostname of the processor this rank is running on.
    fn processor_name(&self) -> String;

    /// Blocking send of `payload` to `dest`, tagged `tag`.
    fn send(&self, dest: i32, tag: i32, payload: &[u8]) -> Result<(), TransportError>;

    /// Blocking receive of a payload from `source`, tagged `tag`.
    fn recv(&self, source: i32, tag: i32) -> Result<Vec<u8>, TransportError>;

    /// All-gather of a single `i32` from every rank, used once at role
    /// election to learn every rank's `LOCAL_RANK`.
    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, TransportError>;

    /// Rank-prefixed diagnostic line. Never called from the hot path.
    fn log(&self, msg: &str) {
        println!("rank {}: {msg}", self.rank());
    }
}

/// Convenience send for an arbitrary self-describing value, layering
/// `bincode` on top of [`Transport::send`]'s raw byte path. Free functions
/// rather than trait methods because a generic method would make `Transport`
/// non-object-safe, and the rest of the crate depends on passing it around
/// as `&dyn Transport`/`Arc<dyn Transport>`.
///
/// Checkpoint chunks never use this path — they move through `send`/`recv`
/// directly — this exists for user-level control messages between peers.
pub fn send_object<T: serde::Serialize>(
    transport: &dyn Transport,
    dest: i32,
    tag: i32,
    value: &T,
) -> Result<(), TransportError> {
    let bytes = bincode::serialize(value).map_err(TransportError::encode_failed)?;
    transport.send(dest, tag, &bytes)
}

/// Convenience receive counterpart to [`send_object`].
pub fn recv_object<T: serde::de::DeserializeOwned>(
    transport: &dyn Transport,
    source: i32,
    tag: i32,
) -> Result<T, TransportError> {
    let bytes = transport.recv(source, tag)?;
    bincode::deserialize(&bytes).map_err(TransportError::encode_failed)
}
