//! Demand sampling against the orchestration engine.
//!
//! Walks workflows → jobs → partitions once per tick and counts the
//! outstanding partitions of in-progress workflows, plus how many of those
//! each worker instance currently holds.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use taskgrid_state::{InstanceId, OrchestrationStateReader};

use crate::error::{AutoscaleError, AutoscaleResult};

/// One tick's view of outstanding work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandSample {
    /// Partitions across all in-progress workflows, assigned or not.
    pub total_partitions: u64,
    /// Instance → partitions currently assigned to it.
    pub per_instance: HashMap<InstanceId, u64>,
}

impl DemandSample {
    /// Instances holding at least one partition.
    pub fn active_instances(&self) -> impl Iterator<Item = &InstanceId> {
        self.per_instance
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, _)| id)
    }

    pub fn is_active(&self, instance: &str) -> bool {
        self.per_instance.get(instance).is_some_and(|count| *count > 0)
    }
}

/// Aggregates partition demand from the orchestration engine.
#[derive(Clone)]
pub struct DemandSampler {
    reader: Arc<dyn OrchestrationStateReader>,
}

impl DemandSampler {
    pub fn new(reader: Arc<dyn OrchestrationStateReader>) -> Self {
        Self { reader }
    }

    /// Take a demand sample.
    ///
    /// Any reader error aborts the whole sample; a partial count would
    /// under-size the pool.
    pub async fn sample(&self) -> AutoscaleResult<DemandSample> {
        let workflows = self
            .reader
            .list_active_workflows()
            .await
            .map_err(|e| AutoscaleError::sampling("list workflows", e))?;

        let mut sample = DemandSample::default();

        for workflow in &workflows {
            if !workflow.state.is_in_progress() {
                debug!(workflow = %workflow.id, state = ?workflow.state, "skipping workflow not in progress");
                continue;
            }

            let mut seen = HashSet::new();
            for job_id in &workflow.jobs {
                if !seen.insert(job_id.as_str()) {
                    debug!(workflow = %workflow.id, job = %job_id, "duplicate job id, counted once");
                    continue;
                }

                let job = self.reader.get_job(job_id).await.map_err(|e| {
                    AutoscaleError::sampling(
                        format!("workflow {} job {}", workflow.id, job_id),
                        e,
                    )
                })?;

                let Some(job) = job else {
                    debug!(workflow = %workflow.id, job = %job_id, "job has no context, skipping");
                    continue;
                };

                for partition in job.partition_ids() {
                    sample.total_partitions += 1;
                    if let Some(instance) = job.assigned_instance(partition) {
                        *sample.per_instance.entry(instance.clone()).or_insert(0) += 1;
                    }
                }
            }
        }

        debug!(
            workflows = workflows.len(),
            partitions = sample.total_partitions,
            instances = sample.per_instance.len(),
            "demand sampled"
        );
        Ok(sample)
    }
}
