//! Movement state stabilization from raw acceleration.
//!
//! The stabilizer spends its first samples estimating the static gravity
//! magnitude, then classifies each subsequent sample from the moving average
//! of gravity-compensated acceleration over a sliding window. Classification
//! uses asymmetric hysteresis: the threshold to enter Running (4.5 m/s²) is
//! wider than the threshold to leave it (2.5 m/s²), which suppresses state
//! flutter at activity boundaries and false Running from a single jolt.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use stridetrack_core::{MovementState, RawAccelSample};

/// Thresholds and window sizes for the movement stabilizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Samples consumed purely for gravity estimation before classifying
    pub warmup_samples: usize,
    /// Sliding window length for the movement-acceleration average
    pub window: usize,
    /// Upper bound of the Still band (m/s²)
    pub still_max: f64,
    /// Upper bound of the Walking band when entering from below (m/s²)
    pub walking_max: f64,
    /// Average required to rise from Walking into Running (m/s²)
    pub running_entry: f64,
    /// Average below which Running drops back to Walking (m/s²)
    pub running_exit: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            warmup_samples: 10,
            window: 10,
            still_max: 1.0,
            walking_max: 2.5,
            running_entry: 4.5,
            running_exit: 2.5,
        }
    }
}

impl StabilizerConfig {
    /// Create a new builder
    pub fn builder() -> StabilizerConfigBuilder {
        StabilizerConfigBuilder::default()
    }

    /// Classify a window average given the previous state.
    ///
    /// Leaving a state requires crossing its exit threshold, so averages in
    /// the band between `running_exit` and `running_entry` keep whichever of
    /// Walking/Running was already current.
    #[must_use]
    pub fn classify(&self, prev: MovementState, avg: f64) -> MovementState {
        match prev {
            MovementState::Running => {
                if avg <= self.still_max {
                    MovementState::Still
                } else if avg <= self.running_exit {
                    MovementState::Walking
                } else {
                    MovementState::Running
                }
            }
            MovementState::Walking => {
                if avg <= self.still_max {
                    MovementState::Still
                } else if avg >= self.running_entry {
                    MovementState::Running
                } else {
                    MovementState::Walking
                }
            }
            MovementState::Still | MovementState::Unknown => {
                if avg <= self.still_max {
                    MovementState::Still
                } else if avg <= self.walking_max {
                    MovementState::Walking
                } else {
                    MovementState::Running
                }
            }
        }
    }
}

/// Builder for [`StabilizerConfig`]
#[derive(Debug, Default)]
pub struct StabilizerConfigBuilder {
    config: StabilizerConfig,
}

impl StabilizerConfigBuilder {
    /// Set the gravity warm-up length (at least 1)
    pub fn warmup_samples(mut self, n: usize) -> Self {
        self.config.warmup_samples = n.max(1);
        self
    }

    /// Set the sliding window length (at least 1)
    pub fn window(mut self, n: usize) -> Self {
        self.config.window = n.max(1);
        self
    }

    /// Set the Still band upper bound
    pub fn still_max(mut self, v: f64) -> Self {
        self.config.still_max = v.max(0.0);
        self
    }

    /// Set the Walking band upper bound
    pub fn walking_max(mut self, v: f64) -> Self {
        self.config.walking_max = v.max(0.0);
        self
    }

    /// Set the Running entry and exit thresholds
    pub fn running_band(mut self, entry: f64, exit: f64) -> Self {
        self.config.running_entry = entry.max(0.0);
        self.config.running_exit = exit.max(0.0);
        self
    }

    /// Build configuration
    pub fn build(self) -> StabilizerConfig {
        self.config
    }
}

/// Smoothed movement classifier over raw acceleration samples.
#[derive(Debug)]
pub struct MovementStabilizer {
    config: StabilizerConfig,
    /// Running sum of sample magnitudes during warm-up
    gravity_sum: f64,
    /// Warm-up samples consumed so far
    warmup_seen: usize,
    /// Gravity magnitude estimate, fixed after warm-up
    gravity: f64,
    /// Sliding window of gravity-compensated magnitudes
    window: VecDeque<f64>,
    /// Running sum of the window contents
    window_sum: f64,
    state: MovementState,
    transitions: u64,
}

impl MovementStabilizer {
    /// Create a stabilizer with the given configuration.
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window),
            config,
            gravity_sum: 0.0,
            warmup_seen: 0,
            gravity: 0.0,
            window_sum: 0.0,
            state: MovementState::Unknown,
            transitions: 0,
        }
    }

    /// Create with default configuration.
    pub fn default_config() -> Self {
        Self::new(StabilizerConfig::default())
    }

    /// Consume one raw sample and return the (possibly unchanged) state.
    ///
    /// During warm-up the sample only contributes to the gravity estimate
    /// and the state stays [`MovementState::Unknown`].
    pub fn push(&mut self, sample: &RawAccelSample) -> MovementState {
        let magnitude = sample.magnitude();

        if self.warmup_seen < self.config.warmup_samples {
            self.gravity_sum += magnitude;
            self.warmup_seen += 1;
            self.gravity = self.gravity_sum / self.warmup_seen as f64;
            return self.state;
        }

        let movement_accel = (magnitude - self.gravity).abs();
        if self.window.len() == self.config.window.max(1) {
            if let Some(evicted) = self.window.pop_front() {
                self.window_sum -= evicted;
            }
        }
        self.window.push_back(movement_accel);
        self.window_sum += movement_accel;

        let avg = self.window_sum / self.window.len() as f64;
        let next = self.config.classify(self.state, avg);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, avg, "movement state transition");
            self.transitions += 1;
            self.state = next;
        }
        self.state
    }

    /// Current smoothed movement state.
    #[must_use]
    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Gravity magnitude estimate (running average during warm-up).
    #[must_use]
    pub fn gravity_estimate(&self) -> f64 {
        self.gravity
    }

    /// True once the gravity warm-up has completed.
    #[must_use]
    pub fn warmed_up(&self) -> bool {
        self.warmup_seen >= self.config.warmup_samples
    }

    /// Number of state transitions since creation or reset.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Reset to the pre-warm-up state.
    pub fn reset(&mut self) {
        self.gravity_sum = 0.0;
        self.warmup_seen = 0;
        self.gravity = 0.0;
        self.window.clear();
        self.window_sum = 0.0;
        self.state = MovementState::Unknown;
        self.transitions = 0;
    }
}
