//! taskgrid-autoscale — demand-driven sizing of the worker container pool.
//!
//! On every tick the autoscaler counts the outstanding partitions of
//! in-progress workflows, smooths that count, converts it into a container
//! target, and tells the resource controller which instances must be kept.
//!
//! # Scaling Algorithm
//!
//! ```text
//! demand   = partitions of in-progress workflows (assigned or not)
//! smoothed = max(last `window_size` admitted demand samples)
//! target   = clamp(ceil(smoothed / partitions_per_container * overprovision_factor),
//!                  min_containers, max_containers)
//!
//! in_use   = known instances holding partitions now
//!          + known instances idle for less than `idle_tolerance`
//! ```
//!
//! Idle classification only filters the instance set handed to the
//! controller; it never changes the target.
//!
//! # Failure Handling
//!
//! A tick that fails anywhere (membership, sampling, controller) is logged
//! and dropped. Window and idle state are left exactly as they were before
//! the tick, and the next tick samples from scratch.

pub mod config;
pub mod error;
pub mod idle;
pub mod reservoir;
pub mod runnable;
pub mod sampler;
pub mod sizing;

pub use config::AutoscaleConfig;
pub use error::{AutoscaleError, AutoscaleResult};
pub use idle::IdleTracker;
pub use reservoir::SlidingWindowReservoir;
pub use runnable::{AutoScalingRunnable, TickOutcome, UnusedPredicate};
pub use sampler::{DemandSample, DemandSampler};
pub use sizing::{target_containers, SizingPolicy};
