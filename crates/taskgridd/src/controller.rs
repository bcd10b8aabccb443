//! Resource controller that records resize requests in the log.
//!
//! Used when the daemon runs without a live resource-manager client, e.g.
//! to dry-run a policy against a captured cluster view.

use std::collections::BTreeSet;
use std::sync::Mutex;

use tracing::info;

use taskgrid_state::{BoxFuture, ClusterResourceController, InstanceId};

/// A resize request as seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    pub target: u32,
    pub in_use: BTreeSet<InstanceId>,
}

/// Logs every request and remembers the most recent one.
#[derive(Debug, Default)]
pub struct LoggingResourceController {
    last: Mutex<Option<ResizeRequest>>,
}

impl LoggingResourceController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<ResizeRequest> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ClusterResourceController for LoggingResourceController {
    fn request_target_number_of_containers<'a>(
        &'a self,
        target: u32,
        in_use: &'a BTreeSet<InstanceId>,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let instances: Vec<&str> = in_use.iter().map(String::as_str).collect();
            info!(containers = target, in_use = ?instances, "container resize requested");

            let mut last = self
                .last
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *last = Some(ResizeRequest {
                target,
                in_use: in_use.clone(),
            });
            Ok(())
        })
    }
}
