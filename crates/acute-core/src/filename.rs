//! Checkpoint file naming: `./[<model_name>/]<model_name>[_<timestamp>].pt.tar`.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::config::AcuteConfig;

/// Build the path the Flusher writes a completed cycle's bytes to.
///
/// `now` is threaded through explicitly (rather than read inside this
/// function) so tests can pin the timestamp instead of racing the clock;
/// [`checkpoint_path`] is what real callers use.
#[must_use]
pub fn checkpoint_path_at(config: &AcuteConfig, now: DateTime<Local>) -> PathBuf {
    let mut name = config.model_name.clone();
    if config.include_datetime_in_filename {
        name.push_str(&format!("_{}", now.format("%Y-%m-%d-%H%M%S")));
    }
    name.push_str(".pt.tar");

    let mut path = PathBuf::from(".");
    if config.file_save_in_dictionary {
        path.push(&config.model_name);
    }
    path.push(name);
    path
}

/// Convenience wrapper over [`checkpoint_path_at`] using the current time.
#[must_use]
pub fn checkpoint_path(config: &AcuteConfig) -> PathBuf {
    checkpoint_path_at(config, Local::now())
}
