//! Positioning fix filtering.
//!
//! Rejects low-accuracy fixes outright and treats fixes that moved less than
//! an activity-dependent minimum from the last accepted fix as GPS noise.
//! Dropped fixes never enter the session route.

use serde::{Deserialize, Serialize};
use stridetrack_core::geo::fix_distance_m;
use stridetrack_core::{ActivityKind, LocationSample};

/// Thresholds for the location filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFilterConfig {
    /// Fixes with reported accuracy above this are rejected (meters)
    pub max_accuracy_m: f64,
    /// Minimum displacement while walking (meters)
    pub min_walking_m: f64,
    /// Minimum displacement while running (meters)
    pub min_running_m: f64,
    /// Minimum displacement while still (meters)
    pub min_still_m: f64,
    /// Minimum displacement for every other activity (meters)
    pub min_default_m: f64,
}

impl Default for LocationFilterConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            min_walking_m: 4.0,
            min_running_m: 5.0,
            min_still_m: 10.0,
            min_default_m: 4.0,
        }
    }
}

impl LocationFilterConfig {
    /// Minimum displacement threshold for an activity class.
    #[must_use]
    pub fn min_distance_for(&self, activity: ActivityKind) -> f64 {
        match activity {
            ActivityKind::Walking => self.min_walking_m,
            ActivityKind::Running => self.min_running_m,
            ActivityKind::Still => self.min_still_m,
            _ => self.min_default_m,
        }
    }
}

/// Why a fix was accepted or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Fix accepted into the route
    Accepted,
    /// Reported accuracy exceeded the cutoff
    DroppedAccuracy,
    /// Displacement from the last accepted fix was below the minimum
    DroppedProximity,
    /// Same timestamp as the last accepted fix
    DroppedDuplicate,
}

impl FilterOutcome {
    /// True if the fix entered the route.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterOutcome::Accepted)
    }
}

/// Stateful filter over a positioning stream.
#[derive(Debug, Default)]
pub struct LocationFilter {
    config: LocationFilterConfig,
    last_accepted: Option<LocationSample>,
    accepted: u64,
    dropped_accuracy: u64,
    dropped_proximity: u64,
    dropped_duplicate: u64,
}

impl LocationFilter {
    /// Create a filter with the given configuration.
    pub fn new(config: LocationFilterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create with default configuration.
    pub fn default_config() -> Self {
        Self::new(LocationFilterConfig::default())
    }

    /// Offer a fix under the current activity class.
    ///
    /// On `Accepted` the fix becomes the new comparison baseline.
    pub fn offer(&mut self, fix: &LocationSample, activity: ActivityKind) -> FilterOutcome {
        if let Some(accuracy) = fix.accuracy_m {
            if accuracy > self.config.max_accuracy_m {
                self.dropped_accuracy += 1;
                tracing::trace!(accuracy, "fix dropped: accuracy above cutoff");
                return FilterOutcome::DroppedAccuracy;
            }
        }

        if let Some(last) = &self.last_accepted {
            if fix.timestamp_ms == last.timestamp_ms {
                self.dropped_duplicate += 1;
                return FilterOutcome::DroppedDuplicate;
            }
            let moved = fix_distance_m(last, fix);
            let min = self.config.min_distance_for(activity);
            if moved < min {
                self.dropped_proximity += 1;
                tracing::trace!(moved, min, ?activity, "fix dropped: below minimum displacement");
                return FilterOutcome::DroppedProximity;
            }
        }

        self.last_accepted = Some(*fix);
        self.accepted += 1;
        FilterOutcome::Accepted
    }

    /// The last accepted fix, if any.
    #[must_use]
    pub fn last_accepted(&self) -> Option<&LocationSample> {
        self.last_accepted.as_ref()
    }

    /// Counts of accepted fixes and drops by reason.
    #[must_use]
    pub fn stats(&self) -> (u64, u64, u64, u64) {
        (
            self.accepted,
            self.dropped_accuracy,
            self.dropped_proximity,
            self.dropped_duplicate,
        )
    }

    /// Reset filter state, keeping the configuration.
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.accepted = 0;
        self.dropped_accuracy = 0;
        self.dropped_proximity = 0;
        self.dropped_duplicate = 0;
    }
}
