//! StrideTrack core library.
//!
//! This crate provides the shared foundation for the StrideTrack
//! walking-session tracking pipeline:
//!
//! - **Domain types**: sensor samples, activity observations, session state
//! - **Error handling**: the [`CoreError`] hierarchy used across the workspace
//! - **Sensor traits**: abstractions over the step counter, accelerometer,
//!   activity classifier, positioning and battery sources
//! - **Geodesy helpers**: great-circle distance between location fixes
//!
//! # Example
//!
//! ```rust
//! use stridetrack_core::geo::haversine_m;
//!
//! // Roughly 1.1 km per 0.01 degrees of latitude at the equator.
//! let d = haversine_m(0.0, 0.0, 0.01, 0.0);
//! assert!((d - 1_113.0).abs() < 15.0);
//! ```

pub mod error;
pub mod geo;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use traits::{
    AccelerometerSource, ActivityClassifierSource, BatteryMonitor, PositioningSource,
    SensorAvailability, StepCounterSource,
};
pub use types::{
    ActivityKind, ActivityObservation, BatteryState, LocationSample, MovementState,
    PollingConfig, PollingPriority, RawAccelSample, SessionStatus, StepDelta,
    ValidationDecision, WalkingSessionState,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::traits::{
        AccelerometerSource, ActivityClassifierSource, BatteryMonitor, PositioningSource,
        StepCounterSource,
    };
    pub use crate::types::{
        ActivityKind, ActivityObservation, BatteryState, LocationSample, MovementState,
        PollingConfig, PollingPriority, RawAccelSample, SessionStatus, StepDelta,
        ValidationDecision, WalkingSessionState,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
