//! Domain types for the StrideTrack walking-session pipeline.
//!
//! All session-facing types derive `serde` so that consumers (view-state
//! layer, persistence layer) can serialize snapshots without conversion.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A raw tri-axis acceleration sample in m/s².
///
/// Ephemeral: consumed by the movement stabilizer, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawAccelSample {
    /// X-axis acceleration (m/s²)
    pub x: f64,
    /// Y-axis acceleration (m/s²)
    pub y: f64,
    /// Z-axis acceleration (m/s²)
    pub z: f64,
    /// Sample timestamp in epoch milliseconds
    pub timestamp_ms: i64,
}

impl RawAccelSample {
    /// Create a new sample.
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: i64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    /// Euclidean magnitude of the acceleration vector.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Smoothed movement state derived from accelerometer data.
///
/// This is a derived, always-current value with no independent lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementState {
    /// Device is at rest
    Still,
    /// Walking-range acceleration
    Walking,
    /// Running-range acceleration
    Running,
    /// Not yet classified (gravity warm-up in progress)
    #[default]
    Unknown,
}

impl MovementState {
    /// True for Walking or Running.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        matches!(self, MovementState::Walking | MovementState::Running)
    }
}

/// Coarse activity class reported by the platform activity classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityKind {
    /// No significant motion
    Still,
    /// On foot, walking
    Walking,
    /// On foot, running
    Running,
    /// In a motor vehicle
    InVehicle,
    /// On a bicycle
    OnBicycle,
    /// Classifier could not decide
    #[default]
    Unknown,
}

impl ActivityKind {
    /// True for vehicle-type activities that veto step crediting.
    #[must_use]
    pub fn is_vehicle(&self) -> bool {
        matches!(self, ActivityKind::InVehicle | ActivityKind::OnBicycle)
    }
}

/// An activity class paired with the classifier's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityObservation {
    /// The reported activity class
    pub kind: ActivityKind,
    /// Classifier confidence, 0–100
    pub confidence: u8,
}

impl ActivityObservation {
    /// Create an observation, clamping confidence to 100.
    pub fn new(kind: ActivityKind, confidence: u8) -> Self {
        Self {
            kind,
            confidence: confidence.min(100),
        }
    }
}

/// A positioning fix.
///
/// Append-only once accepted by the location filter; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Fix timestamp in epoch milliseconds
    pub timestamp_ms: i64,
    /// Reported horizontal accuracy in meters, if the provider supplies one
    pub accuracy_m: Option<f64>,
}

impl LocationSample {
    /// Create a fix without accuracy information.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            accuracy_m: None,
        }
    }

    /// Create a fix with reported accuracy.
    pub fn with_accuracy(latitude: f64, longitude: f64, timestamp_ms: i64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            accuracy_m: Some(accuracy_m),
        }
    }
}

/// A per-tick step increment produced by the step reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDelta {
    /// Steps attributed to this tick
    pub count: u32,
    /// Tick timestamp in epoch milliseconds
    pub timestamp_ms: i64,
}

/// Outcome of the step validation gate for one [`StepDelta`].
///
/// Only `Accepted` mutates cumulative session state; rejections carry the
/// dropped delta for observability and are otherwise inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationDecision {
    /// Delta credited to the session total
    Accepted {
        /// Steps credited
        delta: u32,
    },
    /// Vetoed: activity classifier reports a vehicle
    RejectedVehicle {
        /// Steps dropped
        delta: u32,
    },
    /// Vetoed: device moving in place without GPS displacement
    RejectedStationaryShake {
        /// Steps dropped
        delta: u32,
    },
    /// Vetoed: physically implausible step count for a single tick
    RejectedBurst {
        /// Steps dropped
        delta: u32,
    },
}

impl ValidationDecision {
    /// True if the delta was credited.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationDecision::Accepted { .. })
    }

    /// The step delta the decision was made about.
    #[must_use]
    pub fn delta(&self) -> u32 {
        match self {
            ValidationDecision::Accepted { delta }
            | ValidationDecision::RejectedVehicle { delta }
            | ValidationDecision::RejectedStationaryShake { delta }
            | ValidationDecision::RejectedBurst { delta } => *delta,
        }
    }
}

/// Lifecycle status of a walking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Created, not yet started
    #[default]
    Idle,
    /// Actively accruing steps and distance
    Tracking,
    /// Suspended; sensors still subscribed but accrual excluded
    Paused,
    /// Finished; no further events are processed
    Stopped,
}

impl SessionStatus {
    /// True while the session accepts sensor events (Tracking or Paused).
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Tracking | SessionStatus::Paused)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Idle => "Idle",
            SessionStatus::Tracking => "Tracking",
            SessionStatus::Paused => "Paused",
            SessionStatus::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}

/// The complete observable state of one walking session.
///
/// Exclusively owned and mutated by the session controller; everyone else
/// sees cloned snapshots through the watch stream.
///
/// Invariants: `validated_steps` and `distance_m` never decrease while the
/// session is alive; `route` is append-only and deduplicated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkingSessionState {
    /// Lifecycle status
    pub status: SessionStatus,
    /// Steps credited by the validation gate (monotonic non-decreasing)
    pub validated_steps: u64,
    /// Ordered accepted location fixes
    pub route: Vec<LocationSample>,
    /// Cumulative great-circle distance in meters (monotonic non-decreasing)
    pub distance_m: f64,
    /// Instantaneous speed over the last two accepted fixes (m/s)
    pub speed_mps: f64,
    /// Wall-clock start time, set on `start()`
    pub started_at: Option<DateTime<Utc>>,
    /// Wall-clock stop time, set on `stop()`
    pub stopped_at: Option<DateTime<Utc>>,
    /// Current smoothed movement state
    pub movement: MovementState,
    /// Most recent activity observation
    pub activity: ActivityObservation,
}

impl WalkingSessionState {
    /// Elapsed session duration: start to stop, or start to now while live.
    ///
    /// Returns `None` before `start()`.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        let started = self.started_at?;
        let end = self.stopped_at.unwrap_or_else(Utc::now);
        Some(end - started)
    }
}

/// Positioning request priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollingPriority {
    /// Full-accuracy positioning
    #[default]
    HighAccuracy,
    /// Power-saving positioning
    BalancedPower,
}

/// Live positioning request configuration.
///
/// Recomputed on every activity-class or battery-state change; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Requested update interval in milliseconds
    pub interval_ms: u64,
    /// Requested accuracy priority
    pub priority: PollingPriority,
    /// Minimum displacement between updates in meters
    pub min_distance_m: f64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            priority: PollingPriority::HighAccuracy,
            min_distance_m: 4.0,
        }
    }
}

/// A battery/power reading from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryState {
    /// Charge level, 0–100
    pub percent: u8,
    /// Whether system power-save mode is active
    pub power_save: bool,
}

impl BatteryState {
    /// Create a reading, clamping the percentage to 100.
    pub fn new(percent: u8, power_save: bool) -> Self {
        Self {
            percent: percent.min(100),
            power_save,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_magnitude() {
        let s = RawAccelSample::new(3.0, 4.0, 0.0, 0);
        assert!((s.magnitude() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_movement_state_is_moving() {
        assert!(MovementState::Walking.is_moving());
        assert!(MovementState::Running.is_moving());
        assert!(!MovementState::Still.is_moving());
        assert!(!MovementState::Unknown.is_moving());
    }

    #[test]
    fn test_activity_vehicle_classes() {
        assert!(ActivityKind::InVehicle.is_vehicle());
        assert!(ActivityKind::OnBicycle.is_vehicle());
        assert!(!ActivityKind::Walking.is_vehicle());
        assert!(!ActivityKind::Unknown.is_vehicle());
    }

    #[test]
    fn test_activity_confidence_clamped() {
        let obs = ActivityObservation::new(ActivityKind::Walking, 250);
        assert_eq!(obs.confidence, 100);
    }

    #[test]
    fn test_decision_accessors() {
        let d = ValidationDecision::RejectedBurst { delta: 21 };
        assert!(!d.is_accepted());
        assert_eq!(d.delta(), 21);

        let a = ValidationDecision::Accepted { delta: 3 };
        assert!(a.is_accepted());
        assert_eq!(a.delta(), 3);
    }

    #[test]
    fn test_status_liveness() {
        assert!(SessionStatus::Tracking.is_live());
        assert!(SessionStatus::Paused.is_live());
        assert!(!SessionStatus::Idle.is_live());
        assert!(!SessionStatus::Stopped.is_live());
    }

    #[test]
    fn test_session_state_duration() {
        let mut state = WalkingSessionState::default();
        assert!(state.duration().is_none());

        let start = Utc::now();
        state.started_at = Some(start);
        state.stopped_at = Some(start + Duration::seconds(90));
        assert_eq!(state.duration().unwrap().num_seconds(), 90);
    }

    #[test]
    fn test_session_state_serde_roundtrip() {
        let mut state = WalkingSessionState::default();
        state.status = SessionStatus::Tracking;
        state.validated_steps = 42;
        state.route.push(LocationSample::with_accuracy(52.5, 13.4, 1_000, 8.0));

        let json = serde_json::to_string(&state).unwrap();
        let back: WalkingSessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, SessionStatus::Tracking);
        assert_eq!(back.validated_steps, 42);
        assert_eq!(back.route.len(), 1);
    }

    #[test]
    fn test_battery_state_clamped() {
        let b = BatteryState::new(150, true);
        assert_eq!(b.percent, 100);
        assert!(b.power_save);
    }
}
