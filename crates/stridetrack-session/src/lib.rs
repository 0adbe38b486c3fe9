//! StrideTrack session orchestration library.
//!
//! This crate assembles the conditioned sensor streams into a validated
//! walking session:
//!
//! - **Step reconciliation**: monotonic raw counts → per-tick deltas with
//!   pause exclusion ([`StepReconciler`])
//! - **Step validation**: the multi-signal anti-abuse gate
//!   ([`StepValidationGate`])
//! - **Adaptive polling**: positioning interval/priority from activity and
//!   battery state ([`PollingPolicy`])
//! - **Session control**: the actor that serializes all sensor events and
//!   owns the session state machine ([`SessionController`])
//! - **Channel-backed sources**: trait implementations for integration and
//!   testing ([`sources`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stridetrack_session::{SessionController, SessionControllerConfig, sources::*};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stridetrack_session::SessionError> {
//!     let steps = Arc::new(ChannelStepCounter::new());
//!     let accel = Arc::new(ChannelAccelerometer::new());
//!     let activity = Arc::new(ChannelActivityClassifier::new());
//!     let positioning = Arc::new(ChannelPositioning::new());
//!     let battery = Arc::new(StaticBatteryMonitor::unknown());
//!
//!     let mut controller = SessionController::new(
//!         SessionControllerConfig::default(),
//!         steps.clone(),
//!         accel,
//!         activity,
//!         positioning,
//!         battery,
//!     );
//!     controller.start().await?;
//!     steps.emit(1_000);
//!     controller.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod gate;
pub mod polling;
pub mod reconciler;
pub mod sources;

// Re-export main types
pub use controller::{
    SessionController, SessionControllerConfig, SessionEvent, SessionEventStream,
};
pub use gate::{GateConfig, GateStatistics, GpsEvidence, StepValidationGate};
pub use polling::{PollingPolicy, PollingPolicyConfig};
pub use reconciler::StepReconciler;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Unified error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A mandatory sensor is missing at start time
    #[error("Sensor unavailable: {sensor}")]
    SensorUnavailable {
        /// Name of the missing sensor
        sensor: &'static str,
    },

    /// A lifecycle operation was called from the wrong state
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: stridetrack_core::SessionStatus,
        /// Requested status
        to: stridetrack_core::SessionStatus,
    },

    /// The controller actor is gone (stopped or panicked)
    #[error("Session controller is not running")]
    ControllerGone,

    /// Signal conditioning error
    #[error(transparent)]
    Signal(#[from] stridetrack_signal::SignalError),

    /// Core domain error
    #[error(transparent)]
    Core(#[from] stridetrack_core::CoreError),
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::controller::{
        SessionController, SessionControllerConfig, SessionEvent, SessionEventStream,
    };
    pub use crate::gate::{GateConfig, GpsEvidence, StepValidationGate};
    pub use crate::polling::{PollingPolicy, PollingPolicyConfig};
    pub use crate::reconciler::StepReconciler;
    pub use crate::sources::{
        ChannelAccelerometer, ChannelActivityClassifier, ChannelPositioning, ChannelStepCounter,
        StaticBatteryMonitor,
    };
    pub use crate::{Result, SessionError};
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridetrack_core::SessionStatus;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_display() {
        let e = SessionError::SensorUnavailable { sensor: "step counter" };
        assert_eq!(e.to_string(), "Sensor unavailable: step counter");

        let e = SessionError::InvalidTransition {
            from: SessionStatus::Idle,
            to: SessionStatus::Paused,
        };
        assert_eq!(e.to_string(), "Invalid session transition: Idle -> Paused");
    }
}
