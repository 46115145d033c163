//! The Sender: drains shard bytes the Copier produced and forwards them
//! to the remote sink over the transport, one MPI send per cycle.
//!
//! `std::sync::mpsc` is the channel between them: unbounded, blocking
//! `recv`, no busy-wait.

use std::sync::mpsc;
use std::sync::Mutex;

use acute_transport::{Transport, TransportError};

pub const SHARD_TAG: i32 = 0;

pub struct Sender {
    tx: mpsc::Sender<Vec<u8>>,
    rx: Mutex<mpsc::Receiver<Vec<u8>>>,
}

impl Sender {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Sender {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Called by the Copier worker once a shard's bytes are ready.
    pub fn enqueue(&self, shard_bytes: Vec<u8>) {
        // The receiving end never disconnects while this Sender is alive,
        // so this can't fail in practice.
        let _ = self.tx.send(shard_bytes);
    }

    /// Block until the next shard is enqueued.
    fn dequeue_blocking(&self) -> Option<Vec<u8>> {
        self.rx.lock().unwrap().recv().ok()
    }

    #[cfg(test)]
    fn try_dequeue(&self) -> Option<Vec<u8>> {
        self.rx.lock().unwrap().try_recv().ok()
    }
}

impl Default for Sender {
    fn default() -> Self {
        Self::new()
    }
}

/// The Sender worker loop: forward `save_count` shards to the remote sink
/// at `dest`, tagged [`SHARD_TAG`].
pub fn run_sender_loop(
    sender: &Sender,
    transport: &dyn Transport,
    dest: i32,
    save_count: u64,
) -> Result<(), TransportError> {
    for _ in 0..save_count {
        if let Some(shard_bytes) = sender.dequeue_blocking() {
            transport.send(dest, SHARD_TAG, &shard_bytes)?;
        }
    }
    Ok(())
}
