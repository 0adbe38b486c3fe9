//! Route odometry: cumulative distance, instantaneous speed and step-length
//! calibration over the accepted fix sequence.

use stridetrack_core::geo::fix_distance_m;
use stridetrack_core::LocationSample;

/// Accumulates distance and speed from consecutive accepted fixes.
///
/// Distance is the pairwise great-circle sum and never decreases. Speed is
/// the distance between the last two fixes divided by their timestamp delta.
#[derive(Debug, Default)]
pub struct Odometer {
    distance_m: f64,
    speed_mps: f64,
    prev_fix: Option<LocationSample>,
    last_fix: Option<LocationSample>,
    fixes: u64,
    /// Calibrated average stride length, set lazily from the first usable
    /// step count and refreshed on later ones.
    step_length_m: Option<f64>,
}

impl Odometer {
    /// Create an empty odometer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted fix, updating distance and speed.
    pub fn record_fix(&mut self, fix: &LocationSample) {
        if let Some(last) = &self.last_fix {
            let leg = fix_distance_m(last, fix);
            self.distance_m += leg;

            let dt_ms = fix.timestamp_ms.saturating_sub(last.timestamp_ms);
            if dt_ms > 0 {
                self.speed_mps = leg / (dt_ms as f64 / 1_000.0);
            }
        }
        self.prev_fix = self.last_fix;
        self.last_fix = Some(*fix);
        self.fixes += 1;
    }

    /// Record the current effective step total for stride calibration.
    ///
    /// The estimate initializes the first time both a step count and a
    /// nonzero distance exist, and is refreshed on later calls since the
    /// running ratio costs nothing to maintain.
    pub fn record_steps(&mut self, effective_steps: u64) {
        if effective_steps > 0 && self.distance_m > 0.0 {
            self.step_length_m = Some(self.distance_m / effective_steps as f64);
        }
    }

    /// Recompute speed from the stored last pair of fixes.
    ///
    /// Called once on session stop so the final snapshot reflects whatever
    /// route points were accepted; idempotent.
    pub fn finalize(&mut self) {
        if let (Some(prev), Some(last)) = (&self.prev_fix, &self.last_fix) {
            let dt_ms = last.timestamp_ms.saturating_sub(prev.timestamp_ms);
            if dt_ms > 0 {
                self.speed_mps = fix_distance_m(prev, last) / (dt_ms as f64 / 1_000.0);
            }
        } else {
            self.speed_mps = 0.0;
        }
    }

    /// Cumulative distance in meters.
    #[must_use]
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Instantaneous speed over the last two fixes, m/s.
    #[must_use]
    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Calibrated average stride length in meters, if available.
    #[must_use]
    pub fn step_length_m(&self) -> Option<f64> {
        self.step_length_m
    }

    /// Number of fixes recorded.
    #[must_use]
    pub fn fix_count(&self) -> u64 {
        self.fixes
    }

    /// Reset all odometry state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A point `meters` north of (0, 0); 1° latitude ≈ 111,195 m.
    fn fix_north(meters: f64, timestamp_ms: i64) -> LocationSample {
        LocationSample::new(meters / 111_195.0, 0.0, timestamp_ms)
    }

    #[test]
    fn test_single_fix_no_distance() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        assert_eq!(o.distance_m(), 0.0);
        assert_eq!(o.speed_mps(), 0.0);
        assert_eq!(o.fix_count(), 1);
    }

    #[test]
    fn test_distance_accumulates() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        o.record_fix(&fix_north(10.0, 5_000));
        o.record_fix(&fix_north(25.0, 10_000));

        assert!((o.distance_m() - 25.0).abs() < 0.1, "got {}", o.distance_m());
    }

    #[test]
    fn test_distance_never_decreases() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        o.record_fix(&fix_north(10.0, 5_000));
        let after_out = o.distance_m();
        // Walking back towards the origin still adds distance.
        o.record_fix(&fix_north(2.0, 10_000));
        assert!(o.distance_m() > after_out);
    }

    #[test]
    fn test_speed_from_last_pair() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        // 10 m in 5 s = 2 m/s.
        o.record_fix(&fix_north(10.0, 5_000));
        assert!((o.speed_mps() - 2.0).abs() < 0.05, "got {}", o.speed_mps());
    }

    #[test]
    fn test_zero_dt_keeps_previous_speed() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        o.record_fix(&fix_north(10.0, 5_000));
        let speed = o.speed_mps();
        // Same timestamp: no division, speed unchanged.
        o.record_fix(&fix_north(20.0, 5_000));
        assert_eq!(o.speed_mps(), speed);
    }

    #[test]
    fn test_step_length_calibration_lazy() {
        let mut o = Odometer::new();
        // No distance yet: calibration does not initialize.
        o.record_steps(10);
        assert!(o.step_length_m().is_none());

        o.record_fix(&fix_north(0.0, 0));
        o.record_fix(&fix_north(14.0, 10_000));
        o.record_steps(20);
        let length = o.step_length_m().unwrap();
        assert!((length - 0.7).abs() < 0.01, "got {length}");
    }

    #[test]
    fn test_finalize_idempotent() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        o.record_fix(&fix_north(10.0, 5_000));
        o.finalize();
        let speed = o.speed_mps();
        o.finalize();
        assert_eq!(o.speed_mps(), speed);
    }

    #[test]
    fn test_finalize_without_fixes() {
        let mut o = Odometer::new();
        o.finalize();
        assert_eq!(o.speed_mps(), 0.0);
        assert_eq!(o.distance_m(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut o = Odometer::new();
        o.record_fix(&fix_north(0.0, 0));
        o.record_fix(&fix_north(10.0, 5_000));
        o.record_steps(10);
        o.reset();
        assert_eq!(o.distance_m(), 0.0);
        assert_eq!(o.fix_count(), 0);
        assert!(o.step_length_m().is_none());
    }
}
