//! Adaptive positioning poll policy.
//!
//! Recomputes the positioning request (interval, priority, minimum
//! displacement) from the current activity class and battery state, trading
//! fix freshness against battery drain. Faster activities poll faster;
//! power-save mode and low battery stretch the interval multiplicatively and
//! downgrade the requested accuracy.

use serde::{Deserialize, Serialize};
use stridetrack_core::{ActivityKind, BatteryState, PollingConfig, PollingPriority};

/// Tunables for the polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollingPolicyConfig {
    /// Interval while walking (ms)
    pub walking_interval_ms: u64,
    /// Interval while running (ms)
    pub running_interval_ms: u64,
    /// Interval while still (ms)
    pub still_interval_ms: u64,
    /// Interval in a vehicle or on a bicycle (ms)
    pub vehicle_interval_ms: u64,
    /// Interval for unknown activity (ms)
    pub default_interval_ms: u64,
    /// Hard floor on the interval regardless of activity (ms)
    pub floor_ms: u64,
    /// Interval multiplier when system power-save is active
    pub power_save_factor: f64,
    /// Interval multiplier below [`low_battery_pct`](Self::low_battery_pct)
    pub low_battery_factor: f64,
    /// Interval multiplier between low and [`mid_battery_pct`](Self::mid_battery_pct)
    pub mid_battery_factor: f64,
    /// Low-battery boundary (percent, exclusive)
    pub low_battery_pct: u8,
    /// Mid-battery boundary (percent, exclusive)
    pub mid_battery_pct: u8,
}

impl Default for PollingPolicyConfig {
    fn default() -> Self {
        Self {
            walking_interval_ms: 2_000,
            running_interval_ms: 1_000,
            still_interval_ms: 8_000,
            vehicle_interval_ms: 5_000,
            default_interval_ms: 2_000,
            floor_ms: 1_000,
            power_save_factor: 2.0,
            low_battery_factor: 2.0,
            mid_battery_factor: 1.5,
            low_battery_pct: 20,
            mid_battery_pct: 50,
        }
    }
}

/// Computes positioning requests from activity and battery state.
#[derive(Debug, Default)]
pub struct PollingPolicy {
    config: PollingPolicyConfig,
    /// Activity-keyed minimum displacements, shared with the location filter
    min_distances: stridetrack_signal::LocationFilterConfig,
}

impl PollingPolicy {
    /// Create a policy with the given tunables.
    pub fn new(config: PollingPolicyConfig) -> Self {
        Self {
            config,
            min_distances: stridetrack_signal::LocationFilterConfig::default(),
        }
    }

    /// Create with default tunables.
    pub fn default_config() -> Self {
        Self::new(PollingPolicyConfig::default())
    }

    /// Base interval for an activity class, before battery adjustment.
    #[must_use]
    pub fn base_interval_ms(&self, activity: ActivityKind) -> u64 {
        let ms = match activity {
            ActivityKind::Walking => self.config.walking_interval_ms,
            ActivityKind::Running => self.config.running_interval_ms,
            ActivityKind::Still => self.config.still_interval_ms,
            ActivityKind::InVehicle | ActivityKind::OnBicycle => self.config.vehicle_interval_ms,
            ActivityKind::Unknown => self.config.default_interval_ms,
        };
        ms.max(self.config.floor_ms)
    }

    /// Compute the positioning request for the current conditions.
    ///
    /// `battery: None` (platform cannot report) applies no degradation.
    /// Power-save and battery-tier multipliers stack.
    #[must_use]
    pub fn compute(&self, activity: ActivityKind, battery: Option<BatteryState>) -> PollingConfig {
        let base = self.base_interval_ms(activity) as f64;

        let mut factor = 1.0;
        let mut priority = PollingPriority::HighAccuracy;

        if let Some(battery) = battery {
            if battery.power_save {
                factor *= self.config.power_save_factor;
            }
            if battery.percent < self.config.low_battery_pct {
                factor *= self.config.low_battery_factor;
            } else if battery.percent < self.config.mid_battery_pct {
                factor *= self.config.mid_battery_factor;
            }

            let downgrade = battery.power_save
                || battery.percent < self.config.low_battery_pct
                || (battery.percent < self.config.mid_battery_pct
                    && activity == ActivityKind::Still);
            if downgrade {
                priority = PollingPriority::BalancedPower;
            }
        }

        let interval_ms = ((base * factor) as u64).max(self.config.floor_ms);

        PollingConfig {
            interval_ms,
            priority,
            min_distance_m: self.min_distances.min_distance_for(activity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(percent: u8, power_save: bool) -> Option<BatteryState> {
        Some(BatteryState::new(percent, power_save))
    }

    #[test]
    fn test_base_intervals() {
        let p = PollingPolicy::default_config();
        assert_eq!(p.base_interval_ms(ActivityKind::Walking), 2_000);
        assert_eq!(p.base_interval_ms(ActivityKind::Running), 1_000);
        assert_eq!(p.base_interval_ms(ActivityKind::Still), 8_000);
        assert_eq!(p.base_interval_ms(ActivityKind::InVehicle), 5_000);
        assert_eq!(p.base_interval_ms(ActivityKind::OnBicycle), 5_000);
        assert_eq!(p.base_interval_ms(ActivityKind::Unknown), 2_000);
    }

    #[test]
    fn test_full_battery_no_adjustment() {
        let p = PollingPolicy::default_config();
        let cfg = p.compute(ActivityKind::Walking, battery(90, false));
        assert_eq!(cfg.interval_ms, 2_000);
        assert_eq!(cfg.priority, PollingPriority::HighAccuracy);
        assert_eq!(cfg.min_distance_m, 4.0);
    }

    #[test]
    fn test_low_battery_doubles_interval() {
        let p = PollingPolicy::default_config();
        // Walking, 15%, power-save off: 2000 × 2.0 = 4000.
        let cfg = p.compute(ActivityKind::Walking, battery(15, false));
        assert_eq!(cfg.interval_ms, 4_000);
        assert_eq!(cfg.priority, PollingPriority::BalancedPower);
    }

    #[test]
    fn test_still_mid_battery_downgrades() {
        let p = PollingPolicy::default_config();
        // Still, 35%, power-save off: 8000 × 1.5 = 12000, balanced power.
        let cfg = p.compute(ActivityKind::Still, battery(35, false));
        assert_eq!(cfg.interval_ms, 12_000);
        assert_eq!(cfg.priority, PollingPriority::BalancedPower);
    }

    #[test]
    fn test_walking_mid_battery_keeps_high_accuracy() {
        let p = PollingPolicy::default_config();
        let cfg = p.compute(ActivityKind::Walking, battery(35, false));
        assert_eq!(cfg.interval_ms, 3_000);
        assert_eq!(cfg.priority, PollingPriority::HighAccuracy);
    }

    #[test]
    fn test_power_save_and_battery_stack() {
        let p = PollingPolicy::default_config();
        // Walking, 15%, power-save on: 2000 × 2.0 × 2.0 = 8000.
        let cfg = p.compute(ActivityKind::Walking, battery(15, true));
        assert_eq!(cfg.interval_ms, 8_000);
        assert_eq!(cfg.priority, PollingPriority::BalancedPower);

        // Mid tier stacks too: 2000 × 2.0 × 1.5 = 6000.
        let cfg = p.compute(ActivityKind::Walking, battery(35, true));
        assert_eq!(cfg.interval_ms, 6_000);
    }

    #[test]
    fn test_power_save_alone_downgrades() {
        let p = PollingPolicy::default_config();
        let cfg = p.compute(ActivityKind::Running, battery(95, true));
        assert_eq!(cfg.interval_ms, 2_000);
        assert_eq!(cfg.priority, PollingPriority::BalancedPower);
    }

    #[test]
    fn test_unknown_battery_no_degradation() {
        let p = PollingPolicy::default_config();
        let cfg = p.compute(ActivityKind::Still, None);
        assert_eq!(cfg.interval_ms, 8_000);
        assert_eq!(cfg.priority, PollingPriority::HighAccuracy);
    }

    #[test]
    fn test_interval_floor() {
        let config = PollingPolicyConfig {
            running_interval_ms: 500,
            ..Default::default()
        };
        let p = PollingPolicy::new(config);
        assert_eq!(p.base_interval_ms(ActivityKind::Running), 1_000);
        let cfg = p.compute(ActivityKind::Running, battery(100, false));
        assert_eq!(cfg.interval_ms, 1_000);
    }

    #[test]
    fn test_min_distance_follows_activity() {
        let p = PollingPolicy::default_config();
        assert_eq!(p.compute(ActivityKind::Running, None).min_distance_m, 5.0);
        assert_eq!(p.compute(ActivityKind::Still, None).min_distance_m, 10.0);
        assert_eq!(p.compute(ActivityKind::InVehicle, None).min_distance_m, 4.0);
    }

    #[test]
    fn test_boundary_percentages() {
        let p = PollingPolicy::default_config();
        // Exactly 20% is the mid tier, not the low tier.
        let cfg = p.compute(ActivityKind::Walking, battery(20, false));
        assert_eq!(cfg.interval_ms, 3_000);
        // Exactly 50% is unadjusted.
        let cfg = p.compute(ActivityKind::Walking, battery(50, false));
        assert_eq!(cfg.interval_ms, 2_000);
    }
}
