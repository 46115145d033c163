//! A small ambient metrics counter: plain atomics, no external metrics
//! crate, cheap enough to update on every cycle.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    cycles_completed: AtomicU64,
    bytes_flushed: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, bytes_written: u64) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_flushed.fetch_add(bytes_written, Ordering::Relaxed);
    }

    #[must_use]
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_flushed(&self) -> u64 {
        self.bytes_flushed.load(Ordering::Relaxed)
    }
}
