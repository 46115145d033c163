//! Rank-role election.
//!
//! One rank — the highest world rank — is the remote sink. Every other
//! rank is a trainer. Among trainers, the ones with `LOCAL_RANK == 0`
//! ("shard leaders") are densely renumbered into `0..shard_count` to
//! become `SHARD_RANK`; every other trainer gets `SHARD_RANK == -1`
//! (it belongs to a shard leader's node but doesn't carry a shard itself).
//!
//! The scan that finds shard leaders excludes only the remote sink,
//! expressed directly as `0..remote_sink_rank` rather than as a
//! size-minus-one range that happens to land in the same place only
//! because the remote sink is always the last rank.

use acute_transport::Transport;

use crate::config::ConfigError;

/// The launcher-provided environment variable every process reads its
/// local rank from before calling [`elect`].
pub const LOCAL_RANK_ENV_VAR: &str = "OMPI_COMM_WORLD_LOCAL_RANK";

/// Read this process's local rank from the launcher's environment.
/// `init`/`elect` take `local_rank` as a plain argument so tests and the
/// demo can inject it directly; a real launch reads it through this
/// function first.
///
/// # Errors
///
/// Fails if the launcher didn't set the variable, or set it to something
/// that doesn't parse as an `i32`.
pub fn local_rank_from_env() -> Result<i32, ConfigError> {
    let raw = std::env::var(LOCAL_RANK_ENV_VAR)
        .map_err(|_| ConfigError::MissingLauncherEnvVar(LOCAL_RANK_ENV_VAR))?;
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ConfigError::InvalidLauncherEnvVar {
            name: LOCAL_RANK_ENV_VAR,
            value: raw,
        })
}

/// This process's position in the job, once role election has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles {
    pub world_rank: i32,
    pub world_size: i32,
    pub local_rank: i32,
    /// `true` for the single highest-world-rank process.
    pub is_remote_sink: bool,
    /// Dense index into the shard-leader list, or `-1` if this trainer
    /// isn't a shard leader. Always `-1` for the remote sink.
    pub shard_rank: i32,
    /// World ranks of every shard leader, in shard-rank order.
    pub shard_leader_world_ranks: Vec<i32>,
}

impl Roles {
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shard_leader_world_ranks.len()
    }

    #[must_use]
    pub fn is_shard_leader(&self) -> bool {
        self.shard_rank >= 0
    }
}

/// Elect roles for this process, gathering every rank's `LOCAL_RANK` via
/// one all-gather round trip.
///
/// # Errors
///
/// Propagates a transport failure if the all-gather itself fails.
pub fn elect(transport: &dyn Transport, local_rank: i32) -> Result<Roles, acute_transport::TransportError> {
    let world_rank = transport.rank();
    let world_size = transport.size();
    let all_local_ranks = transport.all_gather_i32(local_rank)?;

    let remote_sink_rank = world_size - 1;
    let shard_leader_world_ranks: Vec<i32> = (0..remote_sink_rank)
        .filter(|&r| all_local_ranks[r as usize] == 0)
        .collect();

    let shard_rank = if world_rank != remote_sink_rank && local_rank == 0 {
        shard_leader_world_ranks
            .iter()
            .position(|&r| r == world_rank)
            .map(|i| i as i32)
            .unwrap_or(-1)
    } else {
        -1
    };

    Ok(Roles {
        world_rank,
        world_size,
        local_rank,
        is_remote_sink: world_rank == remote_sink_rank,
        shard_rank,
        shard_leader_world_ranks,
    })
}

/// Environment variables `elect` publishes for the training framework to
/// pick up.
#[must_use]
pub fn env_vars(roles: &Roles, master_addr: &str, master_port: &str) -> Vec<(String, String)> {
    vec![
        ("LOCAL_RANK".to_string(), roles.local_rank.to_string()),
        ("RANK".to_string(), roles.world_rank.to_string()),
        (
            "WORLD_SIZE".to_string(),
            (roles.world_size - 1).to_string(),
        ),
        ("MASTER_ADDR".to_string(), master_addr.to_string()),
        ("MASTER_PORT".to_string(), master_port.to_string()),
        ("SHARD_RANK".to_string(), roles.shard_rank.to_string()),
    ]
}
