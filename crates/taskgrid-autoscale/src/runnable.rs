//! AutoScalingRunnable — the periodic tick driver.
//!
//! Each tick samples demand, smooths it through the sliding window, sizes
//! the pool, splits known instances into in-use and unused, and sends a
//! single resize request to the resource controller.
//!
//! Window and idle-tracker updates are staged on copies and committed only
//! after the controller accepted the request, so a failed tick leaves no
//! trace in either.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use taskgrid_state::{
    ClusterMembership, ClusterResourceController, InstanceId, OrchestrationStateReader,
};

use crate::config::AutoscaleConfig;
use crate::error::{AutoscaleError, AutoscaleResult};
use crate::idle::IdleTracker;
use crate::reservoir::SlidingWindowReservoir;
use crate::sampler::DemandSampler;
use crate::sizing::{target_containers, SizingPolicy};

/// Strategy deciding whether an idle instance is a scale-down candidate.
///
/// Called with (instance_id, idle_tracker, now) for known instances that
/// hold no partitions in the current tick.
pub type UnusedPredicate = Box<dyn Fn(&str, &IdleTracker, Instant) -> bool + Send + Sync>;

/// The decision produced by a successful tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Containers requested from the resource controller.
    pub target: u32,
    /// Instances reported as in use.
    pub in_use: BTreeSet<InstanceId>,
    /// Known instances idle beyond tolerance.
    pub unused: BTreeSet<InstanceId>,
    /// Raw partition count of this tick.
    pub demand: u64,
    /// Demand after sliding-window smoothing.
    pub smoothed_demand: u64,
}

/// Drives one autoscaling decision per tick.
pub struct AutoScalingRunnable {
    sampler: DemandSampler,
    membership: Arc<dyn ClusterMembership>,
    controller: Arc<dyn ClusterResourceController>,
    policy: SizingPolicy,
    reservoir: SlidingWindowReservoir,
    idle: IdleTracker,
    is_unused: UnusedPredicate,
    prune_departed: bool,
}

impl AutoScalingRunnable {
    /// Create a runnable with the default idle classification.
    pub fn new(
        reader: Arc<dyn OrchestrationStateReader>,
        membership: Arc<dyn ClusterMembership>,
        controller: Arc<dyn ClusterResourceController>,
        policy: SizingPolicy,
        reservoir: SlidingWindowReservoir,
        idle_tolerance: Duration,
    ) -> Self {
        Self {
            sampler: DemandSampler::new(reader),
            membership,
            controller,
            policy,
            reservoir,
            idle: IdleTracker::new(idle_tolerance),
            is_unused: Box::new(|instance: &str, idle: &IdleTracker, now: Instant| {
                idle.is_unused(instance, now)
            }),
            prune_departed: true,
        }
    }

    /// Create a runnable from operator config. Fails on an invalid policy.
    pub fn from_config(
        config: &AutoscaleConfig,
        reader: Arc<dyn OrchestrationStateReader>,
        membership: Arc<dyn ClusterMembership>,
        controller: Arc<dyn ClusterResourceController>,
    ) -> AutoscaleResult<Self> {
        config.validate()?;
        let runnable = Self::new(
            reader,
            membership,
            controller,
            config.sizing_policy()?,
            config.reservoir(),
            config.idle_tolerance()?,
        )
        .with_prune_departed(config.prune_departed_instances);
        Ok(runnable)
    }

    /// Replace the idle classification strategy.
    pub fn with_unused_predicate(mut self, f: UnusedPredicate) -> Self {
        self.is_unused = f;
        self
    }

    /// Forget idle history of instances that left the cluster after each tick.
    pub fn with_prune_departed(mut self, prune: bool) -> Self {
        self.prune_departed = prune;
        self
    }

    pub fn policy(&self) -> &SizingPolicy {
        &self.policy
    }

    pub fn reservoir(&self) -> &SlidingWindowReservoir {
        &self.reservoir
    }

    pub fn idle_tracker(&self) -> &IdleTracker {
        &self.idle
    }

    /// Run a single tick at `now`, propagating any failure.
    ///
    /// State is only updated when the whole tick succeeds.
    pub async fn tick(&mut self, now: Instant) -> AutoscaleResult<TickOutcome> {
        let known = self
            .membership
            .list_known_instances()
            .await
            .map_err(AutoscaleError::Membership)?;

        let sample = self.sampler.sample().await?;

        let mut reservoir = self.reservoir.clone();
        reservoir.add(sample.total_partitions);
        let smoothed_demand = reservoir.max().unwrap_or(sample.total_partitions);

        // Instances without history get one tick of grace, even at zero tolerance.
        let first_seen: BTreeSet<&InstanceId> = known
            .iter()
            .filter(|instance| self.idle.last_active(instance).is_none())
            .collect();

        let mut idle = self.idle.clone();
        for instance in sample.active_instances() {
            idle.record_activity(instance, now);
        }
        for instance in &known {
            idle.observe(instance, now);
        }

        let target = target_containers(smoothed_demand, &self.policy);

        let (in_use, unused): (BTreeSet<InstanceId>, BTreeSet<InstanceId>) =
            known.iter().cloned().partition(|instance| {
                sample.is_active(instance)
                    || first_seen.contains(instance)
                    || !(self.is_unused)(instance.as_str(), &idle, now)
            });

        debug!(
            containers = target,
            demand = sample.total_partitions,
            smoothed_demand,
            ?in_use,
            ?unused,
            "autoscaling decision computed"
        );

        self.controller
            .request_target_number_of_containers(target, &in_use)
            .await
            .map_err(AutoscaleError::Controller)?;

        if self.prune_departed {
            let mut retained = known;
            retained.extend(sample.active_instances().cloned());
            idle.retain_known(&retained);
        }
        self.reservoir = reservoir;
        self.idle = idle;

        info!(
            containers = target,
            demand = sample.total_partitions,
            smoothed_demand,
            in_use = in_use.len(),
            unused = unused.len(),
            "requested target number of containers"
        );

        Ok(TickOutcome {
            target,
            in_use,
            unused,
            demand: sample.total_partitions,
            smoothed_demand,
        })
    }

    /// Run a single tick, logging and swallowing any failure.
    pub async fn run_once(&mut self, now: Instant) -> Option<TickOutcome> {
        match self.tick(now).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(phase = e.phase(), error = %e, "autoscaling tick failed");
                None
            }
        }
    }

    /// Run the autoscaler loop until `shutdown` fires.
    ///
    /// Ticks never overlap; a tick in flight when shutdown is signalled
    /// runs to completion.
    pub async fn run(
        &mut self,
        initial_delay: Duration,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            initial_delay_secs = initial_delay.as_secs(),
            interval_secs = interval.as_secs(),
            idle_tolerance_secs = self.idle.tolerance().as_secs(),
            "autoscaler started"
        );

        tokio::select! {
            _ = tokio::time::sleep(initial_delay) => {}
            _ = shutdown.changed() => {
                info!("autoscaler shutting down before first tick");
                return;
            }
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once(Instant::now()).await;
                }
                _ = shutdown.changed() => {
                    info!("autoscaler shutting down");
                    break;
                }
            }
        }
    }
}
