//! StrideTrack signal conditioning library.
//!
//! This crate turns raw sensor streams into stable, session-grade values:
//!
//! - **Movement stabilization**: gravity-compensated, hysteresis-smoothed
//!   movement state from raw acceleration ([`MovementStabilizer`])
//! - **Location filtering**: accuracy and displacement gating of positioning
//!   fixes ([`LocationFilter`])
//! - **Odometry**: cumulative great-circle distance, instantaneous speed and
//!   step-length calibration ([`Odometer`])
//!
//! # Example
//!
//! ```rust
//! use stridetrack_signal::{MovementStabilizer, StabilizerConfig};
//! use stridetrack_core::RawAccelSample;
//!
//! let mut stabilizer = MovementStabilizer::new(StabilizerConfig::default());
//! // Warm-up: the first samples only estimate gravity.
//! for i in 0..10 {
//!     stabilizer.push(&RawAccelSample::new(0.0, 0.0, 9.81, i * 20));
//! }
//! ```

pub mod location_filter;
pub mod odometer;
pub mod stabilizer;

// Re-export main types for convenience
pub use location_filter::{FilterOutcome, LocationFilter, LocationFilterConfig};
pub use odometer::Odometer;
pub use stabilizer::{MovementStabilizer, StabilizerConfig, StabilizerConfigBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for signal conditioning operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Unified error type for signal conditioning operations
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Core domain error
    #[error(transparent)]
    Core(#[from] stridetrack_core::CoreError),
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::location_filter::{FilterOutcome, LocationFilter, LocationFilterConfig};
    pub use crate::odometer::Odometer;
    pub use crate::stabilizer::{MovementStabilizer, StabilizerConfig};
    pub use crate::{Result, SignalError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
