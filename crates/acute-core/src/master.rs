//! Master: the remote sink's per-cycle conductor. Claims a free slot,
//! fans a start signal out to every Receiver, waits for all of them to
//! report done, then hands the completed slot to the Flusher.

use std::sync::Arc;

use crate::flusher::Flusher;
use crate::receiver::Receiver;
use crate::remote_buffer::RemoteBuffer;

/// Run exactly `save_count` cycles of claim → request-all → wait-all →
/// enqueue → advance, cycling slots `0..remote_buffer.slot_count()`.
pub fn run_master_loop(
    remote_buffer: &Arc<RemoteBuffer>,
    receivers: &[Receiver],
    flusher: &Flusher,
    save_count: u64,
) {
    let slot_count = remote_buffer.slot_count();
    let mut index = 0usize;

    for _ in 0..save_count {
        remote_buffer.claim_slot(index);
        remote_buffer.set_current_slot(index);

        for receiver in receivers {
            receiver.request();
        }
        for receiver in receivers {
            receiver.wait_done();
        }

        flusher.enqueue(index);
        index = (index + 1) % slot_count;
    }
}
