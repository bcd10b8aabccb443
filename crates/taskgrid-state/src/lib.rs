//! taskgrid-state — read-only views of the task cluster for TaskGrid.
//!
//! Holds the snapshot types the autoscaler reasons about (workflows, jobs,
//! partition assignments) and the three collaborator interfaces it talks to:
//!
//! ```text
//! OrchestrationStateReader   workflows → jobs → partitions → instance
//! ClusterMembership          universe of known worker instances
//! ClusterResourceController  "resize to N, keep these alive" sink
//! ```
//!
//! `SnapshotFile` implements both readers on top of a JSON document, which is
//! what `taskgridd` uses when no live orchestrator client is wired in.

pub mod cluster;
pub mod error;
pub mod snapshot_file;
pub mod types;

pub use cluster::{BoxFuture, ClusterMembership, ClusterResourceController, OrchestrationStateReader};
pub use error::{StateError, StateResult};
pub use snapshot_file::{ClusterDocument, SnapshotFile};
pub use types::*;
