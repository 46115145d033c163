//! End-to-end scenarios driving both process roles over an in-process
//! fake transport: a fresh multi-shard run, a resumed run that owes fewer
//! saves, a single-shard-leader job, a single-slot ring forced to
//! serialize back to back cycles, and the configuration error paths an
//! operator can hit before any of this starts.

use std::sync::{Arc, Mutex};
use std::thread;

use acute_core::{
    apply_overrides, AcuteConfig, ConfigValue, NoopBinder, NoopCollective, Outcome, RemoteOutcome,
};
use acute_serializer::{BincodeSerializer, Checkpoint, Serializer};
use acute_transport::{FakeNetwork, FakeTransport, Transport};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Serialize, Deserialize, Clone)]
struct DummyCheckpoint {
    epoch: u64,
    payload: Vec<u8>,
}

impl Checkpoint for DummyCheckpoint {
    fn epoch(&self) -> u64 {
        self.epoch
    }
}

fn base_config() -> AcuteConfig {
    AcuteConfig {
        model_name: "demo-model".into(),
        file_save_in_dictionary: false,
        include_datetime_in_filename: false,
        total_epochs: 1,
        starting_epoch: 1,
        save_period: 1,
        snapshot_path: None,
        remote_buffer_size: 1,
        shard_size: 2,
        master_addr: "127.0.0.1".into(),
        master_port: "29500".into(),
        train_node_auto_start: true,
    }
}

/// Checkpoint naming is a fixed `./`-relative grammar, not a configurable
/// directory, so exercising it end to end means pointing the process's
/// cwd at a tempdir for the duration of the scenario. Serialized behind
/// one lock since `#[test]` functions in this binary run concurrently and
/// the current directory is process-wide state.
static CWD_LOCK: Mutex<()> = Mutex::new(());

fn in_tempdir<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
    let _guard = CWD_LOCK.lock().unwrap();
    let dir = tempdir().unwrap();
    let original = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = f(dir.path());
    std::env::set_current_dir(original).unwrap();
    result
}

/// E1: a fresh run with two shard leaders and one remote sink saves one
/// checkpoint end to end and the file on disk matches the concatenation
/// of both shards.
#[test]
fn fresh_run_with_two_shard_leaders_persists_one_checkpoint() {
    in_tempdir(|dir| {
        let config = base_config().build().unwrap();
        let ranks = FakeNetwork::spawn(3); // 0, 1 = shard leaders; 2 = remote sink
        let serializer = Arc::new(BincodeSerializer);

        thread::scope(|scope| {
            for (rank, transport) in ranks.iter().cloned().enumerate() {
                let config = config.clone();
                let serializer = Arc::clone(&serializer);
                scope.spawn(move || {
                    let outcome = acute_core::init_without_exit(
                        &config,
                        Arc::new(transport) as Arc<dyn Transport>,
                        0,
                        serializer,
                        &NoopCollective,
                        &NoopBinder,
                    )
                    .unwrap();

                    match outcome {
                        RemoteOutcome::Remote(remote_node) => {
                            remote_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, _roles)) => {
                            train_node
                                .save(DummyCheckpoint {
                                    epoch: 1,
                                    payload: vec![rank as u8; 4],
                                })
                                .unwrap();
                            train_node.waiting_for_copying();
                            train_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(_)) => {
                            panic!("both trainers in this scenario are shard leaders");
                        }
                    }
                });
            }
        });

        let written = std::fs::read(dir.join("demo-model.pt.tar")).unwrap();
        assert!(!written.is_empty());
    });
}

/// E5: a configured `snapshot_path` overrides `starting_epoch` with the
/// snapshot's own epoch plus one before the save-count schedule is
/// computed, end to end through `init_without_exit` rather than just the
/// pure `calculate_save_count` helper.
#[test]
fn resuming_from_a_snapshot_path_overrides_starting_epoch() {
    in_tempdir(|dir| {
        let serializer = BincodeSerializer;
        let snapshot = DummyCheckpoint {
            epoch: 5,
            payload: vec![],
        };
        let snapshot_path = dir.join("resume.pt.tar");
        std::fs::write(&snapshot_path, serializer.serialize(&snapshot).unwrap()).unwrap();

        let mut config = base_config();
        config.shard_size = 1;
        config.total_epochs = 10;
        config.save_period = 2;
        config.snapshot_path = Some(snapshot_path);
        let config = config.build().unwrap();

        let ranks = FakeNetwork::spawn(2); // 0 = shard leader; 1 = remote sink
        let serializer = Arc::new(serializer);

        thread::scope(|scope| {
            for transport in ranks.iter().cloned() {
                let config = config.clone();
                let serializer = Arc::clone(&serializer);
                scope.spawn(move || {
                    let outcome = acute_core::init_without_exit(
                        &config,
                        Arc::new(transport) as Arc<dyn Transport>,
                        0,
                        serializer,
                        &NoopCollective,
                        &NoopBinder,
                    )
                    .unwrap();

                    match outcome {
                        RemoteOutcome::Remote(remote_node) => remote_node.join().unwrap(),
                        RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, _)) => {
                            for epoch in [7u64, 9] {
                                train_node
                                    .save(DummyCheckpoint {
                                        epoch,
                                        payload: vec![epoch as u8],
                                    })
                                    .unwrap();
                                train_node.waiting_for_copying();
                            }
                            train_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(_)) => {
                            unreachable!()
                        }
                    }
                });
            }
        });

        assert!(std::fs::read(dir.join("demo-model.pt.tar")).is_ok());
    });
}

/// E2: resuming past the last eligible save point means the remote sink
/// and every trainer expect zero cycles — the schedule that `init` reads
/// off `AcuteConfig` already reflects this before any worker thread is
/// spawned.
#[test]
fn resumed_run_past_final_save_point_expects_zero_cycles() {
    let save_count = acute_core::calculate_save_count(/* starting_epoch */ 11, /* total_epochs */ 10, /* save_period */ 2);
    assert_eq!(save_count, 0);
}

/// E4: a job with a single shard leader still produces a complete file —
/// the remote buffer's shard dimension degenerates to 1, not a special
/// case in the code.
#[test]
fn single_shard_leader_job_completes() {
    in_tempdir(|dir| {
        let mut config = base_config();
        config.shard_size = 1;
        let config = config.build().unwrap();

        let ranks = FakeNetwork::spawn(2); // 0 = shard leader; 1 = remote sink
        let serializer = Arc::new(BincodeSerializer);

        thread::scope(|scope| {
            for transport in ranks.iter().cloned() {
                let config = config.clone();
                let serializer = Arc::clone(&serializer);
                scope.spawn(move || {
                    let outcome = acute_core::init_without_exit(
                        &config,
                        Arc::new(transport) as Arc<dyn Transport>,
                        0,
                        serializer,
                        &NoopCollective,
                        &NoopBinder,
                    )
                    .unwrap();

                    match outcome {
                        RemoteOutcome::Remote(remote_node) => remote_node.join().unwrap(),
                        RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, _)) => {
                            train_node
                                .save(DummyCheckpoint {
                                    epoch: 1,
                                    payload: vec![42; 8],
                                })
                                .unwrap();
                            train_node.waiting_for_copying();
                            train_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(_)) => {
                            unreachable!()
                        }
                    }
                });
            }
        });

        assert!(std::fs::read(dir.join("demo-model.pt.tar")).is_ok());
    });
}

/// E3: a single-slot ring (`remote_buffer_size: 1`) forces Master to wait
/// on the Flusher before it can claim the slot for the next cycle. Three
/// saves through one slot must neither deadlock nor corrupt the last
/// write — each cycle's bytes must be fully drained and released before
/// the next claim succeeds.
#[test]
fn single_slot_ring_serializes_three_cycles_without_corruption() {
    in_tempdir(|dir| {
        let mut config = base_config();
        config.shard_size = 1;
        config.remote_buffer_size = 1;
        config.total_epochs = 3;
        config.save_period = 1;
        let config = config.build().unwrap();

        let ranks = FakeNetwork::spawn(2); // 0 = shard leader; 1 = remote sink
        let serializer = Arc::new(BincodeSerializer);

        thread::scope(|scope| {
            for transport in ranks.iter().cloned() {
                let config = config.clone();
                let serializer = Arc::clone(&serializer);
                scope.spawn(move || {
                    let outcome = acute_core::init_without_exit(
                        &config,
                        Arc::new(transport) as Arc<dyn Transport>,
                        0,
                        serializer,
                        &NoopCollective,
                        &NoopBinder,
                    )
                    .unwrap();

                    match outcome {
                        RemoteOutcome::Remote(remote_node) => remote_node.join().unwrap(),
                        RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, _)) => {
                            for epoch in [1u64, 2, 3] {
                                train_node
                                    .save(DummyCheckpoint {
                                        epoch,
                                        payload: vec![epoch as u8; 4],
                                    })
                                    .unwrap();
                                train_node.waiting_for_copying();
                            }
                            train_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(_)) => {
                            unreachable!()
                        }
                    }
                });
            }
        });

        // The filename doesn't vary by cycle here, so the last cycle's
        // bytes are what's left on disk; a corrupted hand-off between
        // claims would show up as a short or mixed-epoch write instead.
        let expected = BincodeSerializer
            .serialize(&DummyCheckpoint {
                epoch: 3,
                payload: vec![3u8; 4],
            })
            .unwrap();
        let written = std::fs::read(dir.join("demo-model.pt.tar")).unwrap();
        assert_eq!(written, expected);
    });
}

/// `shard_size` configured strictly below the number of shard leaders role
/// election actually discovers means only the leading `shard_size` of them
/// participate — the rest are `NonParticipatingTrainer`s even though role
/// election marked them as shard leaders (spec.md line 195's "number of
/// shard leaders *participating*" contrasted with the larger "discovered"
/// count the invariant on spec.md line 50 bounds `shard_size` by).
#[test]
fn shard_size_below_discovered_leader_count_excludes_the_extra_leaders() {
    in_tempdir(|dir| {
        let mut config = base_config();
        config.shard_size = 2;
        let config = config.build().unwrap();

        // 3 shard leaders discovered (ranks 0,1,2), 1 remote sink (rank 3).
        let ranks = FakeNetwork::spawn(4);
        let serializer = Arc::new(BincodeSerializer);
        let participating = Arc::new(Mutex::new(Vec::new()));

        thread::scope(|scope| {
            for (rank, transport) in ranks.iter().cloned().enumerate() {
                let config = config.clone();
                let serializer = Arc::clone(&serializer);
                let participating = Arc::clone(&participating);
                scope.spawn(move || {
                    let outcome = acute_core::init_without_exit(
                        &config,
                        Arc::new(transport) as Arc<dyn Transport>,
                        0,
                        serializer,
                        &NoopCollective,
                        &NoopBinder,
                    )
                    .unwrap();

                    match outcome {
                        RemoteOutcome::Remote(remote_node) => {
                            remote_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, _roles)) => {
                            participating.lock().unwrap().push(rank);
                            train_node
                                .save(DummyCheckpoint {
                                    epoch: 1,
                                    payload: vec![rank as u8; 4],
                                })
                                .unwrap();
                            train_node.waiting_for_copying();
                            train_node.join().unwrap();
                        }
                        RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(_)) => {}
                    }
                });
            }
        });

        // Ranks 0 and 1 carry a shard; rank 2 was discovered as a shard
        // leader by role election but excluded by `shard_size`.
        let mut participating = participating.lock().unwrap().clone();
        participating.sort_unstable();
        assert_eq!(participating, vec![0, 1]);

        let written = std::fs::read(dir.join("demo-model.pt.tar")).unwrap();
        assert!(!written.is_empty());
    });
}

/// E6: an unrecognized override key fails fast with a typed error rather
/// than being silently dropped.
#[test]
fn unknown_override_key_is_rejected() {
    let config = base_config().build().unwrap();
    let mut overrides = std::collections::HashMap::new();
    overrides.insert("totaly_epochs".to_string(), ConfigValue::UInt(5));
    let err = apply_overrides(config, overrides).unwrap_err();
    assert!(err.to_string().contains("totaly_epochs"));
}

/// Shard size larger than the job's actual shard-leader count is a
/// configuration error caught before any worker thread starts.
#[test]
fn shard_size_exceeding_available_leaders_is_rejected_before_starting_workers() {
    let mut config = base_config();
    config.shard_size = 5;
    let config = config.build().unwrap();
    let ranks = FakeNetwork::spawn(3);
    let serializer = Arc::new(BincodeSerializer);

    thread::scope(|scope| {
        let results: Vec<_> = ranks
            .iter()
            .cloned()
            .map(|transport| {
                let config = config.clone();
                let serializer = Arc::clone(&serializer);
                scope.spawn(move || {
                    acute_core::init_without_exit::<DummyCheckpoint>(
                        &config,
                        Arc::new(transport) as Arc<dyn Transport>,
                        0,
                        serializer,
                        &NoopCollective,
                        &NoopBinder,
                    )
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        for result in results {
            assert!(result.is_err());
        }
    });
}
