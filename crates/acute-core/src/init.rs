//! Top-level lifecycle entry points: elect this process's role, validate
//! its configuration against what role election found, and start the
//! right worker threads for the role.

use std::sync::Arc;

use acute_serializer::{Checkpoint, Serializer};
use acute_transport::Transport;

use crate::collective::{AcceleratorBinder, TrainingCollective};
use crate::config::AcuteConfig;
use crate::error::AcuteError;
use crate::filename::checkpoint_path;
use crate::node::{RemoteNode, TrainNode};
use crate::roles::{self, Roles};
use crate::save_count::calculate_save_count;

/// What this process turned out to be once role election ran.
pub enum Outcome<S> {
    /// A trainer with `LOCAL_RANK == 0`: owns a shard and a live
    /// `TrainNode` to send it through.
    ShardLeader(Arc<TrainNode<S>>, Roles),
    /// A trainer that isn't a shard leader — ACUTE does nothing for it
    /// beyond publishing its role's environment variables.
    NonParticipatingTrainer(Roles),
    /// The remote sink. In production this variant is never actually
    /// observed by a caller: [`init`] runs the remote sink to completion
    /// and exits the process. Tests that want to inspect a `RemoteNode`
    /// call [`init_without_exit`] instead.
    RemoteSink,
}

/// Stand up ACUTE for this process: elect this rank's role, validate the
/// configured shard size against what role election actually found, and
/// (for shard leaders) start the Copier/Sender worker threads unless the
/// caller asked for manual start.
pub fn init<S>(
    config: &AcuteConfig,
    transport: Arc<dyn Transport>,
    local_rank: i32,
    serializer: Arc<dyn Serializer<S>>,
    collective: &dyn TrainingCollective,
    accelerator: &dyn AcceleratorBinder,
) -> Result<Outcome<S>, AcuteError>
where
    S: Checkpoint + Send + 'static,
{
    match init_without_exit(
        config,
        Arc::clone(&transport),
        local_rank,
        serializer,
        collective,
        accelerator,
    )? {
        RemoteOutcome::Remote(remote_node) => {
            remote_node.join()?;
            std::process::exit(0);
        }
        RemoteOutcome::Trainer(outcome) => Ok(outcome),
    }
}

/// Return type of [`init_without_exit`]: either the remote sink's live
/// `RemoteNode` (caller decides when to join/exit) or the same `Outcome`
/// a trainer process gets from [`init`].
pub enum RemoteOutcome<S> {
    Remote(Arc<RemoteNode>),
    Trainer(Outcome<S>),
}

/// Same as [`init`], but returns the remote sink's `RemoteNode` instead of
/// exiting the process — the seam tests and the demo binary use to drive
/// both roles of a job from within one test process.
pub fn init_without_exit<S>(
    config: &AcuteConfig,
    transport: Arc<dyn Transport>,
    local_rank: i32,
    serializer: Arc<dyn Serializer<S>>,
    collective: &dyn TrainingCollective,
    accelerator: &dyn AcceleratorBinder,
) -> Result<RemoteOutcome<S>, AcuteError>
where
    S: Checkpoint + Send + 'static,
{
    let roles = roles::elect(transport.as_ref(), local_rank)?;
    config.validate_against_shard_leaders(roles.shard_count())?;

    let start_epoch = match &config.snapshot_path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            serializer.read_epoch(&bytes)? + 1
        }
        None => config.starting_epoch,
    };
    let save_count = calculate_save_count(start_epoch, config.total_epochs, config.save_period);

    // `shard_size` is the number of shard leaders *participating* — it may
    // be less than the number role election discovered (spec.md line 195),
    // so only the leading `shard_size` of them actually carry a shard.
    // Mirrors ACUTE.py:607,616,619 (`REMOTE.__init__` sizes itself off
    // `shard_size`, not the discovered count).
    let participating_leaders = &roles.shard_leader_world_ranks[..config.shard_size];

    if roles.is_remote_sink {
        let remote_node = Arc::new(RemoteNode::new(
            config.remote_buffer_size,
            participating_leaders,
        ));
        let cfg = config.clone();
        remote_node.run(Arc::clone(&transport), save_count, move |_cycle| {
            checkpoint_path(&cfg)
        })?;
        return Ok(RemoteOutcome::Remote(remote_node));
    }

    collective.init("nccl", roles.world_rank, roles.world_size - 1)?;
    accelerator.bind(roles.local_rank);

    // Mirrors ACUTE.py:429 (`TRAIN.start()` is a no-op once `shard_rank`
    // falls outside `shard_size`, even for a trainer role election marked
    // as a shard leader).
    if !roles.is_shard_leader() || roles.shard_rank as usize >= config.shard_size {
        return Ok(RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(
            roles,
        )));
    }

    let train_node = Arc::new(TrainNode::new());
    if config.train_node_auto_start {
        train_node.start(
            serializer,
            Arc::clone(&transport),
            roles.shard_rank as usize,
            config.shard_size,
            roles.world_size - 1,
            save_count,
        )?;
    } else {
        transport.log(
            "train_node_auto_start is false — call TrainNode::start() yourself before training begins",
        );
    }

    Ok(RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, roles)))
}

/// Tear down the training-collective process group. Symmetric counterpart
/// to `init`.
pub fn destroy(collective: &dyn TrainingCollective) {
    collective.destroy();
}
