//! The step validation gate.
//!
//! A pure decision function over the fused sensor picture: given the
//! smoothed movement state, the coarse activity class, recent GPS evidence
//! and a step delta, it either credits the delta or rejects it with a
//! reason. Rules are evaluated strictly in order:
//!
//! 1. vehicle-class activity vetoes unconditionally;
//! 2. movement without real displacement is a stationary shake;
//! 3. more steps per tick than a human cadence allows is a burst;
//! 4. everything else is accepted.
//!
//! Rejections are ordinary decisions, not errors: they leave cumulative
//! state untouched and are emitted on the session event stream.

use serde::{Deserialize, Serialize};
use stridetrack_core::{ActivityObservation, MovementState, StepDelta, ValidationDecision};

/// Thresholds for the validation gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Maximum steps attributable to a single tick
    pub max_burst_steps: u32,
    /// GPS displacement below which movement counts as in-place (meters)
    pub min_displacement_m: f64,
    /// GPS speed below which movement counts as in-place (m/s)
    pub min_speed_mps: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_burst_steps: 20,
            min_displacement_m: 2.0,
            min_speed_mps: 0.3,
        }
    }
}

/// Recent positioning evidence for the stationary-shake rule.
///
/// Absent entirely when no fix has ever been accepted; in that case the
/// session runs in step-only mode and the rule is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsEvidence {
    /// Distance moved since the previous step tick (meters)
    pub moved_m: f64,
    /// Current instantaneous speed (m/s)
    pub speed_mps: f64,
}

/// Running counts of gate decisions by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatistics {
    /// Accepted deltas
    pub accepted: u64,
    /// Total steps credited
    pub accepted_steps: u64,
    /// Vehicle vetoes
    pub rejected_vehicle: u64,
    /// Stationary-shake rejections
    pub rejected_shake: u64,
    /// Burst rejections
    pub rejected_burst: u64,
}

impl GateStatistics {
    /// Total rejected deltas.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected_vehicle + self.rejected_shake + self.rejected_burst
    }
}

/// The anti-abuse decision function plus its statistics.
#[derive(Debug, Default)]
pub struct StepValidationGate {
    config: GateConfig,
    stats: GateStatistics,
}

impl StepValidationGate {
    /// Create a gate with the given configuration.
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            stats: GateStatistics::default(),
        }
    }

    /// Create with default configuration.
    pub fn default_config() -> Self {
        Self::new(GateConfig::default())
    }

    /// The pure decision, without statistics bookkeeping.
    #[must_use]
    pub fn decide(
        config: &GateConfig,
        movement: MovementState,
        activity: ActivityObservation,
        gps: Option<GpsEvidence>,
        delta: &StepDelta,
    ) -> ValidationDecision {
        if activity.kind.is_vehicle() {
            return ValidationDecision::RejectedVehicle { delta: delta.count };
        }

        if let Some(gps) = gps {
            if movement.is_moving()
                && gps.moved_m < config.min_displacement_m
                && gps.speed_mps < config.min_speed_mps
            {
                return ValidationDecision::RejectedStationaryShake { delta: delta.count };
            }
        }

        if delta.count > config.max_burst_steps {
            return ValidationDecision::RejectedBurst { delta: delta.count };
        }

        ValidationDecision::Accepted { delta: delta.count }
    }

    /// Evaluate a delta and record the decision in the statistics.
    pub fn evaluate(
        &mut self,
        movement: MovementState,
        activity: ActivityObservation,
        gps: Option<GpsEvidence>,
        delta: &StepDelta,
    ) -> ValidationDecision {
        let decision = Self::decide(&self.config, movement, activity, gps, delta);
        match decision {
            ValidationDecision::Accepted { delta } => {
                self.stats.accepted += 1;
                self.stats.accepted_steps += u64::from(delta);
            }
            ValidationDecision::RejectedVehicle { .. } => self.stats.rejected_vehicle += 1,
            ValidationDecision::RejectedStationaryShake { .. } => self.stats.rejected_shake += 1,
            ValidationDecision::RejectedBurst { .. } => self.stats.rejected_burst += 1,
        }
        decision
    }

    /// Decision counts so far.
    #[must_use]
    pub fn stats(&self) -> GateStatistics {
        self.stats
    }

    /// Gate configuration.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Reset statistics, keeping the configuration.
    pub fn reset(&mut self) {
        self.stats = GateStatistics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridetrack_core::ActivityKind;

    fn delta(count: u32) -> StepDelta {
        StepDelta { count, timestamp_ms: 0 }
    }

    fn obs(kind: ActivityKind) -> ActivityObservation {
        ActivityObservation::new(kind, 90)
    }

    fn moving_gps() -> Option<GpsEvidence> {
        Some(GpsEvidence { moved_m: 8.0, speed_mps: 1.4 })
    }

    #[test]
    fn test_vehicle_veto_is_unconditional() {
        let config = GateConfig::default();
        for kind in [ActivityKind::InVehicle, ActivityKind::OnBicycle] {
            let d = StepValidationGate::decide(
                &config,
                MovementState::Still,
                obs(kind),
                moving_gps(),
                &delta(5),
            );
            assert_eq!(d, ValidationDecision::RejectedVehicle { delta: 5 });
        }
    }

    #[test]
    fn test_vehicle_veto_precedes_burst() {
        // Rule 1 wins even when rule 3 would also fire.
        let d = StepValidationGate::decide(
            &GateConfig::default(),
            MovementState::Running,
            obs(ActivityKind::InVehicle),
            moving_gps(),
            &delta(50),
        );
        assert_eq!(d, ValidationDecision::RejectedVehicle { delta: 50 });
    }

    #[test]
    fn test_stationary_shake_rejected() {
        let d = StepValidationGate::decide(
            &GateConfig::default(),
            MovementState::Walking,
            obs(ActivityKind::Walking),
            Some(GpsEvidence { moved_m: 1.0, speed_mps: 0.1 }),
            &delta(5),
        );
        assert_eq!(d, ValidationDecision::RejectedStationaryShake { delta: 5 });
    }

    #[test]
    fn test_shake_requires_both_low_distance_and_low_speed() {
        let config = GateConfig::default();
        // Enough displacement: accepted.
        let d = StepValidationGate::decide(
            &config,
            MovementState::Walking,
            obs(ActivityKind::Walking),
            Some(GpsEvidence { moved_m: 2.5, speed_mps: 0.1 }),
            &delta(5),
        );
        assert!(d.is_accepted());
        // Enough speed: accepted.
        let d = StepValidationGate::decide(
            &config,
            MovementState::Walking,
            obs(ActivityKind::Walking),
            Some(GpsEvidence { moved_m: 1.0, speed_mps: 0.5 }),
            &delta(5),
        );
        assert!(d.is_accepted());
    }

    #[test]
    fn test_shake_only_applies_while_moving() {
        // Still movement state: the shake rule does not fire.
        let d = StepValidationGate::decide(
            &GateConfig::default(),
            MovementState::Still,
            obs(ActivityKind::Walking),
            Some(GpsEvidence { moved_m: 0.0, speed_mps: 0.0 }),
            &delta(5),
        );
        assert!(d.is_accepted());
    }

    #[test]
    fn test_no_gps_skips_shake_rule() {
        // Step-only degradation: without any GPS evidence the shake rule
        // cannot fire and ordinary deltas pass.
        let d = StepValidationGate::decide(
            &GateConfig::default(),
            MovementState::Walking,
            obs(ActivityKind::Walking),
            None,
            &delta(5),
        );
        assert!(d.is_accepted());
    }

    #[test]
    fn test_burst_boundary() {
        let config = GateConfig::default();
        let d = StepValidationGate::decide(
            &config,
            MovementState::Walking,
            obs(ActivityKind::Walking),
            moving_gps(),
            &delta(21),
        );
        assert_eq!(d, ValidationDecision::RejectedBurst { delta: 21 });

        let d = StepValidationGate::decide(
            &config,
            MovementState::Walking,
            obs(ActivityKind::Walking),
            moving_gps(),
            &delta(20),
        );
        assert!(d.is_accepted());
    }

    #[test]
    fn test_statistics() {
        let mut gate = StepValidationGate::default_config();
        gate.evaluate(MovementState::Walking, obs(ActivityKind::Walking), moving_gps(), &delta(4));
        gate.evaluate(MovementState::Walking, obs(ActivityKind::Walking), moving_gps(), &delta(6));
        gate.evaluate(MovementState::Still, obs(ActivityKind::InVehicle), moving_gps(), &delta(3));
        gate.evaluate(MovementState::Walking, obs(ActivityKind::Walking), moving_gps(), &delta(25));
        gate.evaluate(
            MovementState::Running,
            obs(ActivityKind::Walking),
            Some(GpsEvidence { moved_m: 0.5, speed_mps: 0.0 }),
            &delta(2),
        );

        let stats = gate.stats();
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.accepted_steps, 10);
        assert_eq!(stats.rejected_vehicle, 1);
        assert_eq!(stats.rejected_burst, 1);
        assert_eq!(stats.rejected_shake, 1);
        assert_eq!(stats.rejected(), 3);

        gate.reset();
        assert_eq!(gate.stats(), GateStatistics::default());
    }
}
