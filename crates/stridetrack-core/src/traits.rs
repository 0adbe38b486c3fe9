//! Sensor source abstractions.
//!
//! Each platform sensor is modeled as a push-based source with an explicit
//! subscribe lifecycle: a source owns a broadcast channel, hands out
//! receivers on `subscribe()`, and reports availability on demand. The
//! session controller owns subscription lifetime; sources that cannot
//! deliver (missing permission, missing hardware) simply produce no events
//! rather than erroring the pipeline.
//!
//! Sources are injected into the controller at construction. There are no
//! process-wide singletons.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::{
    ActivityObservation, BatteryState, LocationSample, PollingConfig, RawAccelSample,
};

/// Push source of monotonic cumulative step counts.
pub trait StepCounterSource: Send + Sync {
    /// Subscribe to raw cumulative counts.
    fn subscribe(&self) -> broadcast::Receiver<u64>;

    /// Whether the counter hardware is present and permitted.
    fn is_available(&self) -> bool;
}

/// Push source of raw tri-axis acceleration samples.
pub trait AccelerometerSource: Send + Sync {
    /// Subscribe to raw samples.
    fn subscribe(&self) -> broadcast::Receiver<RawAccelSample>;

    /// Whether the accelerometer is present.
    fn is_available(&self) -> bool;
}

/// Push source of coarse activity classifications.
pub trait ActivityClassifierSource: Send + Sync {
    /// Subscribe to activity observations.
    fn subscribe(&self) -> broadcast::Receiver<ActivityObservation>;

    /// Whether the platform classifier is available.
    fn is_available(&self) -> bool;
}

/// Push source of positioning fixes with a live request configuration.
pub trait PositioningSource: Send + Sync {
    /// Subscribe to location fixes.
    fn subscribe(&self) -> broadcast::Receiver<LocationSample>;

    /// Whether positioning is present and permitted.
    fn is_available(&self) -> bool;

    /// Apply a new polling configuration to the underlying provider.
    fn apply_config(&self, config: PollingConfig);
}

/// Polled battery/power state query.
#[async_trait]
pub trait BatteryMonitor: Send + Sync {
    /// Current battery reading, or `None` when the platform cannot report one.
    async fn battery_state(&self) -> Option<BatteryState>;
}

/// Availability snapshot across all injected sensor sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorAvailability {
    /// Step counter present and permitted
    pub step_counter: bool,
    /// Accelerometer present
    pub accelerometer: bool,
    /// Activity classifier available
    pub activity_classifier: bool,
    /// Positioning present and permitted
    pub positioning: bool,
}

impl SensorAvailability {
    /// Whether a session can start at all. Only the step counter is
    /// mandatory; every other source degrades gracefully.
    #[must_use]
    pub fn can_track(&self) -> bool {
        self.step_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_track_requires_step_counter() {
        let all = SensorAvailability {
            step_counter: true,
            accelerometer: true,
            activity_classifier: true,
            positioning: true,
        };
        assert!(all.can_track());

        let no_gps = SensorAvailability {
            positioning: false,
            ..all
        };
        assert!(no_gps.can_track());

        let no_steps = SensorAvailability {
            step_counter: false,
            ..all
        };
        assert!(!no_steps.can_track());
    }
}
