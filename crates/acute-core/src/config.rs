//! Job configuration.
//!
//! `AcuteConfig::build` returns a `Result` rather than panicking: its
//! inputs come from an operator's launch script, and a typo there is a
//! normal operational occurrence, not a programmer bug.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("remote_buffer_size must be at least 1, got {0}")]
    RemoteBufferTooSmall(usize),

    #[error("shard_size must be at least 1, got {0}")]
    ShardSizeTooSmall(usize),

    #[error("shard_size {requested} exceeds the number of shard leaders available ({available})")]
    ShardSizeTooLarge { requested: usize, available: usize },

    #[error("save_period must be at least 1, got {0}")]
    SavePeriodTooSmall(u64),

    #[error("starting_epoch ({starting_epoch}) is greater than total_epochs ({total_epochs})")]
    StartEpochPastEnd {
        starting_epoch: u64,
        total_epochs: u64,
    },

    #[error("model_name must not be empty")]
    EmptyModelName,

    #[error("unexpected override key: {0}")]
    UnexpectedOverrideKey(String),

    #[error("override key {key} has the wrong type for its field")]
    OverrideTypeMismatch { key: String },

    #[error("snapshot_path {0} does not exist")]
    SnapshotPathNotFound(PathBuf),

    #[error("environment variable {0} was not set by the launcher")]
    MissingLauncherEnvVar(&'static str),

    #[error("environment variable {name} was set to {value:?}, which is not a valid rank")]
    InvalidLauncherEnvVar { name: &'static str, value: String },
}

/// Everything a trainer or remote-sink process needs to stand up ACUTE.
///
/// `shard_size` is validated against the job's actual shard-leader count
/// only once role election has run (see [`crate::roles::elect`]), since
/// that count isn't known until all ranks report their `LOCAL_RANK`.
#[derive(Debug, Clone, PartialEq)]
pub struct AcuteConfig {
    pub model_name: String,
    pub file_save_in_dictionary: bool,
    pub include_datetime_in_filename: bool,
    pub total_epochs: u64,
    pub starting_epoch: u64,
    pub save_period: u64,
    pub snapshot_path: Option<PathBuf>,
    pub remote_buffer_size: usize,
    pub shard_size: usize,
    pub master_addr: String,
    pub master_port: String,
    pub train_node_auto_start: bool,
}

impl AcuteConfig {
    /// Validate a fully-populated config, the way an operator's launch
    /// script would assemble one directly.
    pub fn build(self) -> Result<Self, ConfigError> {
        if self.remote_buffer_size < 1 {
            return Err(ConfigError::RemoteBufferTooSmall(self.remote_buffer_size));
        }
        if self.shard_size < 1 {
            return Err(ConfigError::ShardSizeTooSmall(self.shard_size));
        }
        if self.save_period < 1 {
            return Err(ConfigError::SavePeriodTooSmall(self.save_period));
        }
        if self.starting_epoch > self.total_epochs {
            return Err(ConfigError::StartEpochPastEnd {
                starting_epoch: self.starting_epoch,
                total_epochs: self.total_epochs,
            });
        }
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::EmptyModelName);
        }
        if let Some(path) = &self.snapshot_path {
            if !path.exists() {
                return Err(ConfigError::SnapshotPathNotFound(path.clone()));
            }
        }
        Ok(self)
    }

    /// Check `shard_size` against the number of shard leaders role
    /// election actually found. Call once per process, after `elect`.
    pub fn validate_against_shard_leaders(&self, available: usize) -> Result<(), ConfigError> {
        if self.shard_size > available {
            return Err(ConfigError::ShardSizeTooLarge {
                requested: self.shard_size,
                available,
            });
        }
        Ok(())
    }
}

/// A typed override value: a base config plus a handful of named field
/// overrides, validated against the known field set so a typo'd override
/// key fails loudly instead of being silently ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Str(String),
    Bool(bool),
    UInt(u64),
}

/// Apply `overrides` onto `base`, rejecting any key that isn't a known
/// `AcuteConfig` field name.
pub fn apply_overrides(
    mut base: AcuteConfig,
    overrides: HashMap<String, ConfigValue>,
) -> Result<AcuteConfig, ConfigError> {
    for (key, value) in overrides {
        match (key.as_str(), value) {
            ("model_name", ConfigValue::Str(v)) => base.model_name = v,
            ("file_save_in_dictionary", ConfigValue::Bool(v)) => base.file_save_in_dictionary = v,
            ("snapshot_path", ConfigValue::Str(v)) => base.snapshot_path = Some(PathBuf::from(v)),
            ("include_datetime_in_filename", ConfigValue::Bool(v)) => {
                base.include_datetime_in_filename = v;
            }
            ("total_epochs", ConfigValue::UInt(v)) => base.total_epochs = v,
            ("starting_epoch", ConfigValue::UInt(v)) => base.starting_epoch = v,
            ("save_period", ConfigValue::UInt(v)) => base.save_period = v,
            ("remote_buffer_size", ConfigValue::UInt(v)) => base.remote_buffer_size = v as usize,
            ("shard_size", ConfigValue::UInt(v)) => base.shard_size = v as usize,
            ("master_addr", ConfigValue::Str(v)) => base.master_addr = v,
            ("master_port", ConfigValue::Str(v)) => base.master_port = v,
            ("train_node_auto_start", ConfigValue::Bool(v)) => base.train_node_auto_start = v,
            (known, _) if KNOWN_OVERRIDE_KEYS.contains(&known) => {
                return Err(ConfigError::OverrideTypeMismatch {
                    key: known.to_string(),
                })
            }
            (unknown, _) => return Err(ConfigError::UnexpectedOverrideKey(unknown.to_string())),
        }
    }
    Ok(base)
}

const KNOWN_OVERRIDE_KEYS: &[&str] = &[
    "model_name",
    "file_save_in_dictionary",
    "snapshot_path",
    "include_datetime_in_filename",
    "total_epochs",
    "starting_epoch",
    "save_period",
    "remote_buffer_size",
    "shard_size",
    "master_addr",
    "master_port",
    "train_node_auto_start",
];
