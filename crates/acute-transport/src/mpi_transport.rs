//! Real MPI backend, built directly on the `mpi` crate (rsmpi). This is
//! the one external dependency the core is allowed to depend on directly —
//! it is not mocked in production, only swapped for `FakeTransport` in
//! tests and the demo binary.

use mpi::topology::{Process, SystemCommunicator};
use mpi::traits::*;

use crate::error::TransportError;
use crate::framing::{decode_frame, encode_frame};
use crate::Transport;

pub struct MpiTransport {
    _universe: mpi::environment::Universe,
    world: SystemCommunicator,
}

impl MpiTransport {
    /// Initialize the MPI runtime for this process. Must be called exactly
    /// once per process, before any other MPI activity.
    pub fn init() -> Self {
        let universe = mpi::initialize().expect("MPI_Init failed");
        let world = universe.world();
        MpiTransport {
            _universe: universe,
            world,
        }
    }

    fn process_at(&self, rank: i32) -> Process<'_, SystemCommunicator> {
        self.world.process_at_rank(rank)
    }
}

impl Transport for MpiTransport {
    fn rank(&self) -> i32 {
        self.world.rank()
    }

    fn size(&self) -> i32 {
        self.world.size()
    }

    fn processor_name(&self) -> String {
        mpi::environment::processor_name().unwrap_or_else(|_| "unknown".to_string())
    }

    fn send(&self, dest: i32, tag: i32, payload: &[u8]) -> Result<(), TransportError> {
        let framed = encode_frame(payload);
        self.process_at(dest)
            .send_with_tag(&framed[..], tag);
        Ok(())
    }

    fn recv(&self, source: i32, tag: i32) -> Result<Vec<u8>, TransportError> {
        let (framed, _status) = self.process_at(source).matched_probe_with_tag(tag).matched_receive_vec();
        decode_frame(&framed).map(<[u8]>::to_vec)
    }

    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, TransportError> {
        let mut recv_buf = vec![0i32; self.size() as usize];
        self.world.all_gather_into(&value, &mut recv_buf[..]);
        Ok(recv_buf)
    }
}
