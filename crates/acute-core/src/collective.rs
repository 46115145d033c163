//! External collaborators rendered as traits, so the core can be driven
//! in tests and the demo without the real training stack present.

use crate::error::CollectiveError;

/// Stand-in for the DDP/NCCL process-group collaborator. Real deployments
/// wire this to their training framework's own process-group init/destroy
/// (e.g. `torch.distributed`); ACUTE only needs the two calls this trait
/// names.
pub trait TrainingCollective: Send + Sync {
    fn init(&self, backend: &str, rank: i32, world_size: i32) -> Result<(), CollectiveError>;
    fn destroy(&self);
}

/// Does nothing. Useful for tests, the demo binary, and any deployment
/// that manages its own process group independently of ACUTE.
pub struct NoopCollective;

impl TrainingCollective for NoopCollective {
    fn init(&self, _backend: &str, _rank: i32, _world_size: i32) -> Result<(), CollectiveError> {
        Ok(())
    }

    fn destroy(&self) {}
}

/// Stand-in for binding this process to a local accelerator (e.g.
/// `torch.cuda.set_device(local_rank)`).
pub trait AcceleratorBinder: Send + Sync {
    fn bind(&self, local_rank: i32);
}

pub struct NoopBinder;

impl AcceleratorBinder for NoopBinder {
    fn bind(&self, _local_rank: i32) {}
}
