//! A Receiver: one per shard, running on the remote sink. Waits for
//! Master's start signal, pulls this cycle's shard bytes off the wire from
//! its shard leader, writes them into the current slot, then signals done.

use std::sync::Arc;

use acute_transport::{Transport, TransportError};

use crate::event::Event;
use crate::remote_buffer::RemoteBuffer;
use crate::sender::SHARD_TAG;

pub struct Receiver {
    pub shard_rank: usize,
    pub source_world_rank: i32,
    start: Event,
    done: Event,
}

impl Receiver {
    #[must_use]
    pub fn new(shard_rank: usize, source_world_rank: i32) -> Self {
        Receiver {
            shard_rank,
            source_world_rank,
            start: Event::new(),
            done: Event::new(),
        }
    }

    /// Called by Master at the top of a cycle, once the slot is claimed
    /// and published.
    pub fn request(&self) {
        self.start.set();
    }

    /// Called by Master to wait for this shard to land in the buffer.
    pub fn wait_done(&self) {
        self.done.wait();
        self.done.clear();
    }
}

/// The Receiver worker loop: run exactly `save_count` cycles.
pub fn run_receiver_loop(
    receiver: &Receiver,
    transport: &dyn Transport,
    remote_buffer: &Arc<RemoteBuffer>,
    save_count: u64,
) -> Result<(), TransportError> {
    for _ in 0..save_count {
        receiver.start.wait();
        receiver.start.clear();

        let slot = remote_buffer.current_slot();
        let bytes = transport.recv(receiver.source_world_rank, SHARD_TAG)?;
        remote_buffer.write_cell(slot, receiver.shard_rank, bytes);

        receiver.done.set();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acute_transport::FakeNetwork;
    use std::thread;

    #[test]
    fn request_then_wait_done_round_trips() {
        let buffer = Arc::new(RemoteBuffer::new(1, 1));
        buffer.claim_slot(0);
        buffer.set_current_slot(0);

        let ranks = FakeNetwork::spawn(2);
        let (shard_leader, remote_sink) = (ranks[0].clone(), ranks[1].clone());
        let receiver = Arc::new(Receiver::new(0, 0));

        let worker_receiver = Arc::clone(&receiver);
        let worker_buffer = Arc::clone(&buffer);
        let handle = thread::spawn(move || {
            run_receiver_loop(&worker_receiver, &remote_sink, &worker_buffer, 1).unwrap();
        });

        shard_leader.send(1, SHARD_TAG, b"payload").unwrap();
        receiver.request();
        receiver.wait_done();
        handle.join().unwrap();

        assert_eq!(buffer.take_and_release(0), b"payload".to_vec());
    }
}
