//! The Flusher: durably persists completed cycles to disk.
//!
//! Pops a slot index Master has finished filling, drains and releases it
//! (freeing the slot for reuse before the file write even starts — see
//! `remote_buffer`'s module doc), then writes the concatenated bytes with
//! an explicit `fsync` so a crash immediately after this call can't lose
//! the checkpoint to the page cache.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::metrics::Metrics;
use crate::remote_buffer::RemoteBuffer;

pub struct Flusher {
    tx: mpsc::Sender<usize>,
    rx: Mutex<mpsc::Receiver<usize>>,
}

impl Flusher {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Flusher {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Called by Master once a slot's receivers have all reported done.
    pub fn enqueue(&self, slot: usize) {
        let _ = self.tx.send(slot);
    }

    fn dequeue_blocking(&self) -> Option<usize> {
        self.rx.lock().unwrap().recv().ok()
    }
}

impl Default for Flusher {
    fn default() -> Self {
        Self::new()
    }
}

/// The Flusher worker loop: run exactly `save_count` cycles, each writing
/// one checkpoint file to `path_for_cycle(cycle_index)`, recording the
/// cycle and its byte count in `metrics` once the write has synced.
pub fn run_flusher_loop(
    flusher: &Flusher,
    remote_buffer: &Arc<RemoteBuffer>,
    metrics: &Metrics,
    save_count: u64,
    mut path_for_cycle: impl FnMut(u64) -> PathBuf,
) -> std::io::Result<()> {
    for cycle in 0..save_count {
        let Some(slot) = flusher.dequeue_blocking() else {
            break;
        };
        let bytes = remote_buffer.take_and_release(slot);
        write_durably(&path_for_cycle(cycle), &bytes)?;
        metrics.record_cycle(bytes.len() as u64);
    }
    Ok(())
}

fn write_durably(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}
