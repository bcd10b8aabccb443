//! Autoscaling policy configuration.
//!
//! Loaded from the `[autoscaling]` table of a TOML file. Every key is
//! optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [autoscaling]
//! partitions_per_container = 2
//! min_containers = 1
//! max_containers = 20
//! overprovision_factor = 1.2
//! window_size = 10
//! idle_tolerance = "10m"
//! tick_interval = "60s"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AutoscaleError, AutoscaleResult};
use crate::reservoir::SlidingWindowReservoir;
use crate::sizing::SizingPolicy;

/// Top-level config file layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub autoscaling: AutoscaleConfig,
}

/// Autoscaler settings as written by operators.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutoscaleConfig {
    pub partitions_per_container: u32,
    pub min_containers: u32,
    pub max_containers: u32,
    pub overprovision_factor: f64,
    /// Number of recent demand samples the smoothing window keeps.
    pub window_size: usize,
    /// Samples above this value are discarded. Unbounded when unset.
    pub admission_ceiling: Option<u64>,
    /// How long an instance may hold no partitions before it is reported unused.
    pub idle_tolerance: String,
    pub tick_interval: String,
    /// Delay before the first tick after startup.
    pub initial_delay: String,
    /// Forget idle history for instances that left the cluster.
    pub prune_departed_instances: bool,
}

impl Default for AutoscaleConfig {
    fn default() -> Self {
        Self {
            partitions_per_container: 1,
            min_containers: 1,
            max_containers: u32::MAX,
            overprovision_factor: 1.0,
            window_size: 1,
            admission_ceiling: None,
            idle_tolerance: "10m".to_string(),
            tick_interval: "60s".to_string(),
            initial_delay: "60s".to_string(),
            prune_departed_instances: true,
        }
    }
}

impl AutoscaleConfig {
    /// Read the `[autoscaling]` table from a TOML file.
    pub fn from_file(path: &Path) -> AutoscaleResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AutoscaleError::ConfigRead(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AutoscaleResult<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| AutoscaleError::ConfigRead(e.to_string()))?;
        Ok(file.autoscaling)
    }

    /// Check ranges. An invalid policy must stop the process at startup.
    pub fn validate(&self) -> AutoscaleResult<()> {
        self.sizing_policy()?;
        if self.window_size < 1 {
            return Err(AutoscaleError::InvalidConfig(
                "window_size must be at least 1".to_string(),
            ));
        }
        self.idle_tolerance()?;
        self.initial_delay()?;
        if self.tick_interval()?.is_zero() {
            return Err(AutoscaleError::InvalidConfig(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the validated sizing policy.
    pub fn sizing_policy(&self) -> AutoscaleResult<SizingPolicy> {
        SizingPolicy::new(
            self.partitions_per_container,
            self.min_containers,
            self.max_containers,
            self.overprovision_factor,
        )
    }

    /// Build the smoothing window described by this config.
    pub fn reservoir(&self) -> SlidingWindowReservoir {
        SlidingWindowReservoir::new(
            self.window_size.max(1),
            self.admission_ceiling.unwrap_or(u64::MAX),
        )
    }

    pub fn idle_tolerance(&self) -> AutoscaleResult<Duration> {
        parse_duration(&self.idle_tolerance)
    }

    pub fn tick_interval(&self) -> AutoscaleResult<Duration> {
        parse_duration(&self.tick_interval)
    }

    pub fn initial_delay(&self) -> AutoscaleResult<Duration> {
        parse_duration(&self.initial_delay)
    }
}

/// Parse a duration string like "500ms", "30s", "5m", "1h".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> AutoscaleResult<Duration> {
    let s = s.trim();
    let invalid = || AutoscaleError::InvalidDuration(s.to_string());

    let (digits, millis_per_unit) = if let Some(ms) = s.strip_suffix("ms") {
        (ms, 1)
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1_000)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60_000)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3_600_000)
    } else {
        (s, 1_000)
    };

    let value = digits.trim().parse::<u64>().map_err(|_| invalid())?;
    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}
