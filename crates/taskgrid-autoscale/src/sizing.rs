//! Target container count calculation.
//!
//! ```text
//! target = clamp(ceil(demand / partitions_per_container * overprovision_factor),
//!                min_containers, max_containers)
//! ```
//!
//! The clamp is applied last, so a non-zero minimum is honored even when
//! there is no work at all.

use crate::error::{AutoscaleError, AutoscaleResult};

/// Validated sizing bounds and scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingPolicy {
    partitions_per_container: u32,
    min_containers: u32,
    max_containers: u32,
    overprovision_factor: f64,
}

impl SizingPolicy {
    pub fn new(
        partitions_per_container: u32,
        min_containers: u32,
        max_containers: u32,
        overprovision_factor: f64,
    ) -> AutoscaleResult<Self> {
        if partitions_per_container < 1 {
            return Err(AutoscaleError::InvalidConfig(
                "partitions_per_container must be at least 1".to_string(),
            ));
        }
        if min_containers > max_containers {
            return Err(AutoscaleError::InvalidConfig(format!(
                "min_containers ({min_containers}) exceeds max_containers ({max_containers})"
            )));
        }
        if !overprovision_factor.is_finite() || overprovision_factor <= 0.0 {
            return Err(AutoscaleError::InvalidConfig(format!(
                "overprovision_factor must be a positive number, got {overprovision_factor}"
            )));
        }
        Ok(Self {
            partitions_per_container,
            min_containers,
            max_containers,
            overprovision_factor,
        })
    }

    pub fn partitions_per_container(&self) -> u32 {
        self.partitions_per_container
    }

    pub fn min_containers(&self) -> u32 {
        self.min_containers
    }

    pub fn max_containers(&self) -> u32 {
        self.max_containers
    }

    pub fn overprovision_factor(&self) -> f64 {
        self.overprovision_factor
    }
}

/// Number of containers needed to serve `demand` partitions under `policy`.
pub fn target_containers(demand: u64, policy: &SizingPolicy) -> u32 {
    let per_container = demand as f64 / f64::from(policy.partitions_per_container);
    // Float-to-int casts saturate, so huge demand lands on u32::MAX before the clamp.
    let raw = (per_container * policy.overprovision_factor).ceil() as u32;
    raw.clamp(policy.min_containers, policy.max_containers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(ppc: u32, min: u32, max: u32, factor: f64) -> SizingPolicy {
        SizingPolicy::new(ppc, min, max, factor).unwrap()
    }

    #[test]
    fn one_partition_per_container() {
        assert_eq!(target_containers(2, &policy(1, 1, 10, 1.0)), 2);
        assert_eq!(target_containers(5, &policy(1, 1, 10, 1.0)), 5);
    }

    #[test]
    fn uses_ceiling_division() {
        assert_eq!(target_containers(2, &policy(2, 1, 10, 1.0)), 1);
        assert_eq!(target_containers(3, &policy(2, 1, 10, 1.0)), 2);
        assert_eq!(target_containers(7, &policy(3, 0, 10, 1.0)), 3);
    }

    #[test]
    fn min_wins_over_small_demand() {
        assert_eq!(target_containers(2, &policy(1, 5, 10, 1.0)), 5);
        assert_eq!(target_containers(0, &policy(1, 3, 10, 1.0)), 3);
    }

    #[test]
    fn zero_demand_with_zero_min_scales_to_zero() {
        assert_eq!(target_containers(0, &policy(1, 0, 10, 1.0)), 0);
    }

    #[test]
    fn max_wins_over_large_demand() {
        assert_eq!(target_containers(2, &policy(1, 1, 1, 1.0)), 1);
        assert_eq!(target_containers(u64::MAX, &policy(1, 1, 10, 1.0)), 10);
    }

    #[test]
    fn overprovision_rounds_up() {
        assert_eq!(target_containers(2, &policy(1, 1, 10, 1.2)), 3);
        assert_eq!(target_containers(2, &policy(1, 1, 10, 0.1)), 1);
        assert_eq!(target_containers(2, &policy(1, 1, 10, 6.0)), 10);
    }

    #[test]
    fn unbounded_max_saturates() {
        let p = policy(1, 1, u32::MAX, 2.0);
        assert_eq!(target_containers(u64::MAX, &p), u32::MAX);
    }

    #[test]
    fn monotonic_in_demand() {
        let p = policy(3, 2, 40, 1.3);
        let mut prev = 0;
        for demand in 0..200 {
            let target = target_containers(demand, &p);
            assert!(target >= prev, "demand {demand}: {target} < {prev}");
            assert!((2..=40).contains(&target));
            prev = target;
        }
    }

    #[test]
    fn non_increasing_in_partitions_per_container() {
        for demand in [0, 1, 7, 50, 333] {
            let mut prev = u32::MAX;
            for ppc in 1..20 {
                let target = target_containers(demand, &policy(ppc, 1, 100, 1.0));
                assert!(target <= prev, "demand {demand}, ppc {ppc}");
                prev = target;
            }
        }
    }

    #[test]
    fn rejects_invalid_policies() {
        assert!(SizingPolicy::new(0, 1, 10, 1.0).is_err());
        assert!(SizingPolicy::new(1, 11, 10, 1.0).is_err());
        assert!(SizingPolicy::new(1, 1, 10, 0.0).is_err());
        assert!(SizingPolicy::new(1, 1, 10, f64::NAN).is_err());
        assert!(SizingPolicy::new(1, 0, 0, 1.0).is_ok());
    }
}
