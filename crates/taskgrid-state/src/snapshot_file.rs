//! SnapshotFile — JSON-file backed cluster view.
//!
//! Listing workflows or instances re-reads the file, so edits made while the
//! daemon is running show up on the next tick. Job lookups are answered from
//! the document read by the last workflow listing, so one demand sample never
//! mixes two versions of the file. A missing or malformed file surfaces as a
//! `StateError`, which the autoscaler treats as a failed sample.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{BoxFuture, ClusterMembership, OrchestrationStateReader};
use crate::error::{StateError, StateResult};
use crate::types::*;

/// On-disk layout of a cluster view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterDocument {
    /// Known worker instances.
    #[serde(default)]
    pub instances: BTreeSet<InstanceId>,
    #[serde(default)]
    pub workflows: Vec<WorkflowSnapshot>,
    #[serde(default)]
    pub jobs: Vec<JobSnapshot>,
}

impl ClusterDocument {
    /// Look up a job by id.
    pub fn job(&self, job_id: &str) -> Option<&JobSnapshot> {
        self.jobs.iter().find(|j| j.id == job_id)
    }
}

/// Cluster view loaded from a JSON file.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    /// Document read by the last `list_active_workflows` call.
    current: Mutex<Option<ClusterDocument>>,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the current document.
    pub fn load(&self) -> StateResult<ClusterDocument> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StateError::NotFound(self.path.display().to_string())
            } else {
                StateError::Read(format!("{}: {e}", self.path.display()))
            }
        })?;
        let doc: ClusterDocument = serde_json::from_str(&content)
            .map_err(|e| StateError::Deserialize(format!("{}: {e}", self.path.display())))?;
        debug!(
            path = ?self.path,
            workflows = doc.workflows.len(),
            jobs = doc.jobs.len(),
            instances = doc.instances.len(),
            "cluster snapshot loaded"
        );
        Ok(doc)
    }

    fn current(&self) -> MutexGuard<'_, Option<ClusterDocument>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load the document and keep it for the job lookups that follow.
    fn refresh(&self) -> StateResult<Vec<WorkflowSnapshot>> {
        let doc = self.load()?;
        let workflows = doc.workflows.clone();
        *self.current() = Some(doc);
        Ok(workflows)
    }

    fn find_job(&self, job_id: &str) -> StateResult<Option<JobSnapshot>> {
        if let Some(doc) = self.current().as_ref() {
            return Ok(doc.job(job_id).cloned());
        }
        Ok(self.load()?.job(job_id).cloned())
    }
}

impl OrchestrationStateReader for SnapshotFile {
    fn list_active_workflows(&self) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowSnapshot>>> {
        Box::pin(async move { Ok(self.refresh()?) })
    }

    fn get_job<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, anyhow::Result<Option<JobSnapshot>>> {
        Box::pin(async move { Ok(self.find_job(job_id)?) })
    }
}

impl ClusterMembership for SnapshotFile {
    fn list_known_instances(&self) -> BoxFuture<'_, anyhow::Result<BTreeSet<InstanceId>>> {
        Box::pin(async move { Ok(self.load()?.instances) })
    }
}
