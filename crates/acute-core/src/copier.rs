//! The Copier: hands a serialized snapshot's shard slice off to the
//! Sender, one cycle at a time.
//!
//! The training loop calls [`Copier::request`] with its in-memory
//! checkpoint; a dedicated worker thread (driven by [`run_copier_loop`])
//! wakes, takes ownership of it, serializes it, and — only then — marks
//! the copy complete so the training loop can safely mutate its state
//! again. At most one snapshot is ever outstanding: a `request` arriving
//! before the previous one has completed blocks on the same condition
//! variable [`Copier::waiting_for_copying`] waits on, rather than failing.

use std::sync::{Condvar, Mutex};

use acute_serializer::{Checkpoint, Serializer};

use crate::sender::Sender;
use crate::shard::shard_range;

struct CopierState<S> {
    pending: Option<S>,
    completed: bool,
}

pub struct Copier<S> {
    state: Mutex<CopierState<S>>,
    filled_cv: Condvar,
    completed_cv: Condvar,
}

impl<S> Copier<S> {
    #[must_use]
    pub fn new() -> Self {
        Copier {
            state: Mutex::new(CopierState {
                pending: None,
                completed: true,
            }),
            filled_cv: Condvar::new(),
            completed_cv: Condvar::new(),
        }
    }

    /// Hand off `checkpoint` for asynchronous copying. Blocks until the
    /// previous request (if any) has been picked up and completed.
    pub fn request(&self, checkpoint: S) {
        let mut state = self.state.lock().unwrap();
        while state.pending.is_some() || !state.completed {
            state = self.completed_cv.wait(state).unwrap();
        }
        state.completed = false;
        state.pending = Some(checkpoint);
        drop(state);
        self.filled_cv.notify_one();
    }

    /// Block until the most recently requested copy has completed.
    pub fn waiting_for_copying(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.completed {
            state = self.completed_cv.wait(state).unwrap();
        }
    }

    #[must_use]
    pub fn is_copy_completed(&self) -> bool {
        self.state.lock().unwrap().completed
    }

    fn take(&self) -> S {
        let mut state = self.state.lock().unwrap();
        while state.pending.is_none() {
            state = self.filled_cv.wait(state).unwrap();
        }
        state.pending.take().unwrap()
    }

    fn mark_completed(&self) {
        let mut state = self.state.lock().unwrap();
        state.completed = true;
        drop(state);
        self.completed_cv.notify_all();
    }
}

impl<S> Default for Copier<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The Copier worker loop: run exactly `save_count` cycles, each time
/// taking the pending checkpoint, serializing it, completing the
/// handshake, slicing out this shard's range, and enqueueing it to the
/// Sender.
pub fn run_copier_loop<S: Checkpoint>(
    copier: &Copier<S>,
    serializer: &dyn Serializer<S>,
    shard_rank: usize,
    shard_count: usize,
    sender: &Sender,
    save_count: u64,
) -> Result<(), crate::error::AcuteError> {
    for _ in 0..save_count {
        let checkpoint = copier.take();
        let serialized = serializer.serialize(&checkpoint)?;
        copier.mark_completed();

        let range = shard_range(serialized.len(), shard_rank, shard_count);
        let shard_bytes = serialized[range].to_vec();
        sender.enqueue(shard_bytes);
    }
    Ok(())
}
