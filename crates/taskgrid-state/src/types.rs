//! Snapshot types for the task cluster.
//!
//! These are immutable per-tick views handed out by the orchestration
//! engine. All types are serializable to/from JSON so that a cluster view
//! can be loaded from disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a workflow.
pub type WorkflowId = String;

/// Unique identifier for a job within the orchestration engine.
pub type JobId = String;

/// Unique identifier for a worker instance (participant).
pub type InstanceId = String;

/// Identifier of a partition within its job.
pub type PartitionId = u32;

// ── Workflow ──────────────────────────────────────────────────────

/// Lifecycle state of a workflow as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    NotStarted,
    InProgress,
    Stopped,
    Completed,
    Failed,
    Aborted,
    TimedOut,
    /// The orchestrator has no context for this workflow.
    #[default]
    Unknown,
}

impl WorkflowState {
    /// Whether partitions of a workflow in this state count as demand.
    pub fn is_in_progress(self) -> bool {
        self == WorkflowState::InProgress
    }
}

/// Point-in-time view of a workflow and the jobs it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    pub id: WorkflowId,
    #[serde(default)]
    pub state: WorkflowState,
    /// Jobs in the workflow's DAG, in orchestrator order.
    #[serde(default)]
    pub jobs: Vec<JobId>,
}

impl WorkflowSnapshot {
    pub fn new(id: impl Into<WorkflowId>, state: WorkflowState, jobs: &[&str]) -> Self {
        Self {
            id: id.into(),
            state,
            jobs: jobs.iter().map(|j| j.to_string()).collect(),
        }
    }
}

// ── Job ───────────────────────────────────────────────────────────

/// Point-in-time view of a job's partitions and their assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    /// Partition → assigned instance. `None` means not yet assigned.
    #[serde(default)]
    pub partitions: BTreeMap<PartitionId, Option<InstanceId>>,
}

impl JobSnapshot {
    /// Create a job with no partitions.
    pub fn new(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            partitions: BTreeMap::new(),
        }
    }

    /// Add a partition, optionally assigned to an instance.
    pub fn with_partition(mut self, partition: PartitionId, instance: Option<&str>) -> Self {
        self.partitions
            .insert(partition, instance.map(str::to_string));
        self
    }

    /// All partition ids owned by this job.
    pub fn partition_ids(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.partitions.keys().copied()
    }

    /// The instance a partition is assigned to, if any.
    pub fn assigned_instance(&self, partition: PartitionId) -> Option<&InstanceId> {
        self.partitions.get(&partition).and_then(Option::as_ref)
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_progress_counts() {
        assert!(WorkflowState::InProgress.is_in_progress());
        for state in [
            WorkflowState::NotStarted,
            WorkflowState::Stopped,
            WorkflowState::Completed,
            WorkflowState::Failed,
            WorkflowState::Aborted,
            WorkflowState::TimedOut,
            WorkflowState::Unknown,
        ] {
            assert!(!state.is_in_progress(), "{state:?}");
        }
    }

    #[test]
    fn unassigned_partition_has_no_instance() {
        let job = JobSnapshot::new("job1")
            .with_partition(1, None)
            .with_partition(2, Some("worker-1"));

        assert_eq!(job.partition_count(), 2);
        assert_eq!(job.assigned_instance(1), None);
        assert_eq!(job.assigned_instance(2).map(String::as_str), Some("worker-1"));
        assert_eq!(job.assigned_instance(3), None);
    }

    #[test]
    fn workflow_state_serializes_snake_case() {
        let json = serde_json::to_string(&WorkflowState::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn workflow_without_state_is_unknown() {
        let wf: WorkflowSnapshot = serde_json::from_str(r#"{"id": "wf1"}"#).unwrap();
        assert_eq!(wf.state, WorkflowState::Unknown);
        assert!(wf.jobs.is_empty());
    }
}
