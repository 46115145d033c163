//! Distributed-training checkpoint offload fabric.
//!
//! Shards a training snapshot across the shard-leader trainers of a job,
//! streams the shards over MPI to a single dedicated remote sink rank,
//! and lets that sink reassemble and durably persist them (`fsync`) in
//! parallel with ongoing training. See [`init`] for the entry point.

pub mod collective;
pub mod config;
pub mod copier;
pub mod error;
pub mod event;
pub mod filename;
pub mod flusher;
pub mod init;
pub mod master;
pub mod metrics;
pub mod node;
pub mod receiver;
pub mod remote_buffer;
pub mod roles;
pub mod save_count;
pub mod sender;
pub mod shard;

pub use collective::{AcceleratorBinder, NoopBinder, NoopCollective, TrainingCollective};
pub use config::{apply_overrides, AcuteConfig, ConfigError, ConfigValue};
pub use error::{AcuteError, CollectiveError, ProtocolError};
pub use init::{destroy, init, init_without_exit, Outcome, RemoteOutcome};
pub use metrics::Metrics;
pub use node::{RemoteNode, TrainNode};
pub use roles::{elect as elect_roles, local_rank_from_env, Roles, LOCAL_RANK_ENV_VAR};
pub use save_count::calculate_save_count;
pub use shard::shard_range;
