//! End-to-end ACUTE demo over an in-process fake transport: two shard
//! leaders and one remote sink, saving a single toy checkpoint and
//! reading the resulting file back off disk. No MPI cluster required —
//! this exercises the same code path `acute-core`'s integration tests do,
//! just with stdout narration.

use std::sync::Arc;
use std::thread;

use acute_core::{init_without_exit, AcuteConfig, NoopBinder, NoopCollective, Outcome, RemoteOutcome};
use acute_serializer::{BincodeSerializer, Checkpoint};
use acute_transport::{FakeNetwork, Transport};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct ToyCheckpoint {
    epoch: u64,
    weights: Vec<f32>,
}

impl Checkpoint for ToyCheckpoint {
    fn epoch(&self) -> u64 {
        self.epoch
    }
}

fn main() {
    let dir = std::env::temp_dir().join(format!("acute-demo-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create demo output directory");
    std::env::set_current_dir(&dir).expect("switch into demo output directory");

    let config = AcuteConfig {
        model_name: "demo-transformer".into(),
        file_save_in_dictionary: false,
        include_datetime_in_filename: false,
        total_epochs: 1,
        starting_epoch: 1,
        save_period: 1,
        snapshot_path: None,
        remote_buffer_size: 2,
        shard_size: 2,
        master_addr: "127.0.0.1".into(),
        master_port: "29500".into(),
        train_node_auto_start: true,
    }
    .build()
    .expect("demo config is valid");

    let ranks = FakeNetwork::spawn(3); // ranks 0,1: shard leaders; rank 2: remote sink
    let serializer = Arc::new(BincodeSerializer);

    thread::scope(|scope| {
        for transport in ranks.iter().cloned() {
            let config = config.clone();
            let serializer = Arc::clone(&serializer);
            scope.spawn(move || {
                let rank = transport.rank();
                let transport: Arc<dyn Transport> = Arc::new(transport);
                let outcome = init_without_exit(
                    &config,
                    Arc::clone(&transport),
                    0,
                    serializer,
                    &NoopCollective,
                    &NoopBinder,
                )
                .expect("init should succeed for a well-formed demo config");

                match outcome {
                    RemoteOutcome::Remote(remote_node) => {
                        transport.log("acting as remote sink");
                        remote_node.join().expect("remote worker threads should finish cleanly");
                        transport.log("checkpoint durably written");
                    }
                    RemoteOutcome::Trainer(Outcome::ShardLeader(train_node, roles)) => {
                        transport.log(&format!(
                            "acting as shard leader {} of {}",
                            roles.shard_rank,
                            roles.shard_count()
                        ));
                        train_node
                            .save(ToyCheckpoint {
                                epoch: 1,
                                weights: vec![rank as f32; 16],
                            })
                            .expect("train_node_auto_start left the Copier running");
                        train_node.waiting_for_copying();
                        train_node
                            .join()
                            .expect("trainer worker threads should finish cleanly");
                    }
                    RemoteOutcome::Trainer(Outcome::NonParticipatingTrainer(_)) => {
                        transport.log("not a shard leader, nothing to do");
                    }
                }
            });
        }
    });

    let written = std::fs::read(dir.join("demo-transformer.pt.tar")).expect("checkpoint file exists");
    println!("wrote {} bytes to {}", written.len(), dir.display());
}
