//! The two process roles ACUTE stands up: a `TrainNode` on every trainer
//! rank, a `RemoteNode` on the dedicated remote sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use acute_serializer::{Checkpoint, Serializer};
use acute_transport::Transport;

use crate::copier::{run_copier_loop, Copier};
use crate::error::{AcuteError, ProtocolError};
use crate::flusher::{run_flusher_loop, Flusher};
use crate::master::run_master_loop;
use crate::metrics::Metrics;
use crate::receiver::{run_receiver_loop, Receiver};
use crate::remote_buffer::RemoteBuffer;
use crate::sender::{run_sender_loop, Sender};

type WorkerHandle = JoinHandle<Result<(), AcuteError>>;

fn join_all(handles: Vec<WorkerHandle>) -> Result<(), AcuteError> {
    for handle in handles {
        handle
            .join()
            .map_err(|_| AcuteError::Protocol(ProtocolError::WorkerPanicked("thread panicked".into())))??;
    }
    Ok(())
}

/// A shard-leader trainer's side of ACUTE: a Copier and a Sender, each
/// running on their own thread once [`TrainNode::start`] is called.
pub struct TrainNode<S> {
    copier: Arc<Copier<S>>,
    sender: Arc<Sender>,
    handles: Mutex<Vec<WorkerHandle>>,
    started: AtomicBool,
}

impl<S> TrainNode<S>
where
    S: Checkpoint + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        TrainNode {
            copier: Arc::new(Copier::new()),
            sender: Arc::new(Sender::new()),
            handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Hand the current in-memory checkpoint off for asynchronous
    /// shard-and-send. Fails synchronously if `start` hasn't been called
    /// yet — no worker thread would ever pick the checkpoint up. Blocks if
    /// the previous save hasn't completed yet.
    pub fn save(&self, checkpoint: S) -> Result<(), ProtocolError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(ProtocolError::NotStarted);
        }
        self.copier.request(checkpoint);
        Ok(())
    }

    /// Block until the most recently requested save has been copied out
    /// of the training loop's state (safe to mutate again after this
    /// returns; the shard may still be in flight to the remote sink).
    pub fn waiting_for_copying(&self) {
        self.copier.waiting_for_copying();
    }

    /// Spawn the Copier and Sender worker threads. Call once per process;
    /// `init` calls this automatically unless the caller asked for
    /// `train_node_auto_start = false`. A second call fails synchronously
    /// instead of racing a second Copier/Sender pair against the first.
    pub fn start(
        &self,
        serializer: Arc<dyn Serializer<S>>,
        transport: Arc<dyn Transport>,
        shard_rank: usize,
        shard_count: usize,
        remote_sink_world_rank: i32,
        save_count: u64,
    ) -> Result<(), ProtocolError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ProtocolError::AlreadyStarted);
        }

        let copier = Arc::clone(&self.copier);
        let sender = Arc::clone(&self.sender);
        let copier_handle: WorkerHandle = thread::spawn(move || {
            run_copier_loop(
                &copier,
                serializer.as_ref(),
                shard_rank,
                shard_count,
                &sender,
                save_count,
            )
        });

        let sender = Arc::clone(&self.sender);
        let sender_handle: WorkerHandle = thread::spawn(move || {
            run_sender_loop(&sender, transport.as_ref(), remote_sink_world_rank, save_count)
                .map_err(AcuteError::from)
        });

        let mut handles = self.handles.lock().unwrap();
        handles.push(copier_handle);
        handles.push(sender_handle);
        drop(handles);
        Ok(())
    }

    /// Wait for every worker thread to finish, propagating the first
    /// error encountered (fail-fast, per the error-handling policy).
    pub fn join(&self) -> Result<(), AcuteError> {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        join_all(handles)
    }
}

impl<S> Default for TrainNode<S>
where
    S: Checkpoint + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The remote sink's side of ACUTE: one Receiver per shard, a Master
/// conductor, and a Flusher, each running on their own thread once
/// [`RemoteNode::start`] is called.
pub struct RemoteNode {
    remote_buffer: Arc<RemoteBuffer>,
    receivers: Arc<Vec<Receiver>>,
    flusher: Arc<Flusher>,
    metrics: Arc<Metrics>,
    handles: Mutex<Vec<WorkerHandle>>,
    started: AtomicBool,
}

impl RemoteNode {
    #[must_use]
    pub fn new(remote_buffer_size: usize, shard_leader_world_ranks: &[i32]) -> Self {
        let receivers = shard_leader_world_ranks
            .iter()
            .enumerate()
            .map(|(shard_rank, &world_rank)| Receiver::new(shard_rank, world_rank))
            .collect();
        RemoteNode {
            remote_buffer: Arc::new(RemoteBuffer::new(
                remote_buffer_size,
                shard_leader_world_ranks.len(),
            )),
            receivers: Arc::new(receivers),
            flusher: Arc::new(Flusher::new()),
            metrics: Arc::new(Metrics::new()),
            handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Cycle/byte counters accumulated by the Flusher so far. Safe to read
    /// from another thread while `run` is still in progress.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Spawn one thread per Receiver plus the Flusher thread, then run the
    /// Master loop on the calling thread (Master is the conductor, not a
    /// detached worker: `run` returns once every cycle has been handed to
    /// the Flusher, though the Flusher's own writes may still be draining
    /// — call [`RemoteNode::join`] to wait for those too). A second call
    /// fails synchronously instead of racing a second set of workers
    /// against the first.
    pub fn run(
        &self,
        transport: Arc<dyn Transport>,
        save_count: u64,
        mut path_for_cycle: impl FnMut(u64) -> std::path::PathBuf + Send + 'static,
    ) -> Result<(), ProtocolError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ProtocolError::AlreadyStarted);
        }

        let mut handles = Vec::new();

        for shard_rank in 0..self.receivers.len() {
            let transport = Arc::clone(&transport);
            let remote_buffer = Arc::clone(&self.remote_buffer);
            // Master (run below, on the calling thread) addresses the same
            // Receiver instances by index through this Arc, so the worker
            // thread borrows rather than owning a separate copy.
            let receivers = Arc::clone(&self.receivers);
            let handle: WorkerHandle = thread::spawn(move || {
                run_receiver_loop(&receivers[shard_rank], transport.as_ref(), &remote_buffer, save_count)
                    .map_err(AcuteError::from)
            });
            handles.push(handle);
        }

        let flusher = Arc::clone(&self.flusher);
        let remote_buffer = Arc::clone(&self.remote_buffer);
        let metrics = Arc::clone(&self.metrics);
        let flusher_handle: WorkerHandle = thread::spawn(move || {
            run_flusher_loop(&flusher, &remote_buffer, &metrics, save_count, move |cycle| {
                path_for_cycle(cycle)
            })
            .map_err(AcuteError::from)
        });
        handles.push(flusher_handle);

        *self.handles.lock().unwrap() = handles;

        run_master_loop(&self.remote_buffer, &self.receivers, &self.flusher, save_count);
        Ok(())
    }

    /// Wait for every Receiver and the Flusher to finish their remaining
    /// work after [`RemoteNode::run`] has returned.
    pub fn join(&self) -> Result<(), AcuteError> {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        join_all(handles)
    }
}
