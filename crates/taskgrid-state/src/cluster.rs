//! Collaborator interfaces the autoscaler depends on.
//!
//! Production wires real orchestrator and resource-manager clients behind
//! these traits; tests wire in-memory fakes. All methods return boxed
//! futures so the traits stay object-safe and can be held as
//! `Arc<dyn Trait>`.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use crate::types::{InstanceId, JobSnapshot, WorkflowSnapshot};

/// Boxed future alias for collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to the task orchestration engine.
pub trait OrchestrationStateReader: Send + Sync {
    /// All workflows the orchestrator currently knows about, in any state.
    fn list_active_workflows(&self) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowSnapshot>>>;

    /// Fetch a job's partitions and assignments.
    ///
    /// Returns `Ok(None)` when the orchestrator has no context for the job.
    fn get_job<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, anyhow::Result<Option<JobSnapshot>>>;
}

/// Read access to cluster membership.
pub trait ClusterMembership: Send + Sync {
    /// Every worker instance eligible to be reported in-use or unused.
    fn list_known_instances(&self) -> BoxFuture<'_, anyhow::Result<BTreeSet<InstanceId>>>;
}

/// Sink for container resize requests.
pub trait ClusterResourceController: Send + Sync {
    /// Ask for `target` containers, keeping `in_use` instances alive.
    fn request_target_number_of_containers<'a>(
        &'a self,
        target: u32,
        in_use: &'a BTreeSet<InstanceId>,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

