//! The remote buffer: a ring of `remote_buffer_size` slots, each holding
//! one cell per shard, guarded by a dirty-bit per slot.
//!
//! A slot's dirty bit is `true` from the moment Master claims it for a new
//! cycle until the Flusher has drained its cells into a concatenated
//! buffer — *not* until the file write finishes. This lets Master start
//! reusing the slot for a future cycle the moment its bytes are safely
//! out of the shared buffer, while the (slower) fsync to disk proceeds
//! concurrently.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// `[slot][shard_rank] -> Option<bytes>`, plus one dirty bit per slot.
pub struct RemoteBuffer {
    cells: Vec<Vec<Mutex<Option<Vec<u8>>>>>,
    dirty: Mutex<Vec<bool>>,
    dirty_cv: Condvar,
    current_slot: AtomicUsize,
}

impl RemoteBuffer {
    #[must_use]
    pub fn new(remote_buffer_size: usize, shard_count: usize) -> Self {
        assert!(remote_buffer_size > 0, "remote_buffer_size must be positive");
        let cells = (0..remote_buffer_size)
            .map(|_| (0..shard_count).map(|_| Mutex::new(None)).collect())
            .collect();
        RemoteBuffer {
            cells,
            dirty: Mutex::new(vec![false; remote_buffer_size]),
            dirty_cv: Condvar::new(),
            current_slot: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.cells.len()
    }

    /// Block until slot `index` is clean, then mark it dirty (claimed for
    /// the current cycle).
    pub fn claim_slot(&self, index: usize) {
        let mut dirty = self.dirty.lock().unwrap();
        while dirty[index] {
            dirty = self.dirty_cv.wait(dirty).unwrap();
        }
        dirty[index] = true;
    }

    /// Publish which slot receivers should write into for the in-flight
    /// cycle. Must be called after `claim_slot` and before signalling any
    /// receiver to start.
    pub fn set_current_slot(&self, index: usize) {
        self.current_slot.store(index, Ordering::Release);
    }

    #[must_use]
    pub fn current_slot(&self) -> usize {
        self.current_slot.load(Ordering::Acquire)
    }

    /// Called by a Receiver once it has this cycle's shard bytes.
    pub fn write_cell(&self, slot: usize, shard_rank: usize, bytes: Vec<u8>) {
        *self.cells[slot][shard_rank].lock().unwrap() = Some(bytes);
    }

    /// Called by the Flusher: drain every cell in `slot` into one
    /// concatenated buffer (in shard-rank order) and clear the slot's
    /// dirty bit so Master can reuse it — *before* the caller writes the
    /// result to disk.
    pub fn take_and_release(&self, slot: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for cell in &self.cells[slot] {
            if let Some(bytes) = cell.lock().unwrap().take() {
                out.extend_from_slice(&bytes);
            }
        }
        let mut dirty = self.dirty.lock().unwrap();
        dirty[slot] = false;
        drop(dirty);
        self.dirty_cv.notify_all();
        out
    }
}
