//! Channel-backed sensor source implementations.
//!
//! Each source owns a broadcast channel: platform glue (or a test) pushes
//! readings in with `emit`, and every subscriber receives them. Availability
//! is fixed at construction, mirroring how a real device either has a sensor
//! or does not; an unavailable source hands out receivers that never fire.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use stridetrack_core::{
    AccelerometerSource, ActivityClassifierSource, ActivityObservation, BatteryMonitor,
    BatteryState, LocationSample, PollingConfig, PositioningSource, RawAccelSample,
    StepCounterSource,
};

const DEFAULT_CAPACITY: usize = 64;

/// Channel-backed step counter source.
#[derive(Debug)]
pub struct ChannelStepCounter {
    tx: broadcast::Sender<u64>,
    available: bool,
}

impl ChannelStepCounter {
    /// Create an available source.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an available source with a specific channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, available: true }
    }

    /// Create a source that reports unavailability and never emits.
    pub fn unavailable() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, available: false }
    }

    /// Publish a raw cumulative count to all subscribers.
    pub fn emit(&self, raw: u64) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(raw);
        }
    }
}

impl Default for ChannelStepCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl StepCounterSource for ChannelStepCounter {
    fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Channel-backed accelerometer source.
#[derive(Debug)]
pub struct ChannelAccelerometer {
    tx: broadcast::Sender<RawAccelSample>,
    available: bool,
}

impl ChannelAccelerometer {
    /// Create an available source.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx, available: true }
    }

    /// Create a source that reports unavailability and never emits.
    pub fn unavailable() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, available: false }
    }

    /// Publish a sample to all subscribers.
    pub fn emit(&self, sample: RawAccelSample) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(sample);
        }
    }
}

impl Default for ChannelAccelerometer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerometerSource for ChannelAccelerometer {
    fn subscribe(&self) -> broadcast::Receiver<RawAccelSample> {
        self.tx.subscribe()
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Channel-backed activity classifier source.
#[derive(Debug)]
pub struct ChannelActivityClassifier {
    tx: broadcast::Sender<ActivityObservation>,
    available: bool,
}

impl ChannelActivityClassifier {
    /// Create an available source.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx, available: true }
    }

    /// Create a source that reports unavailability and never emits.
    pub fn unavailable() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, available: false }
    }

    /// Publish an observation to all subscribers.
    pub fn emit(&self, observation: ActivityObservation) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(observation);
        }
    }
}

impl Default for ChannelActivityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityClassifierSource for ChannelActivityClassifier {
    fn subscribe(&self) -> broadcast::Receiver<ActivityObservation> {
        self.tx.subscribe()
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Channel-backed positioning source with a live request configuration.
///
/// The session controller pushes [`PollingConfig`] updates through
/// `apply_config`; platform glue reads the latest request with
/// [`current_config`](Self::current_config) when scheduling fixes.
#[derive(Debug)]
pub struct ChannelPositioning {
    tx: broadcast::Sender<LocationSample>,
    available: bool,
    config: Mutex<Option<PollingConfig>>,
}

impl ChannelPositioning {
    /// Create an available source.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self {
            tx,
            available: true,
            config: Mutex::new(None),
        }
    }

    /// Create a source that reports unavailability and never emits.
    pub fn unavailable() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            available: false,
            config: Mutex::new(None),
        }
    }

    /// Publish a fix to all subscribers.
    pub fn emit(&self, fix: LocationSample) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(fix);
        }
    }

    /// The most recently applied polling configuration.
    #[must_use]
    pub fn current_config(&self) -> Option<PollingConfig> {
        *self.config.lock()
    }
}

impl Default for ChannelPositioning {
    fn default() -> Self {
        Self::new()
    }
}

impl PositioningSource for ChannelPositioning {
    fn subscribe(&self) -> broadcast::Receiver<LocationSample> {
        self.tx.subscribe()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn apply_config(&self, config: PollingConfig) {
        tracing::debug!(
            interval_ms = config.interval_ms,
            priority = ?config.priority,
            min_distance_m = config.min_distance_m,
            "positioning request updated"
        );
        *self.config.lock() = Some(config);
    }
}

/// Battery monitor backed by a settable reading.
#[derive(Debug)]
pub struct StaticBatteryMonitor {
    state: Mutex<Option<BatteryState>>,
}

impl StaticBatteryMonitor {
    /// Create a monitor with a fixed initial reading.
    pub fn new(state: BatteryState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Create a monitor that reports no reading at all.
    pub fn unknown() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Replace the reading returned by future queries.
    pub fn set(&self, state: BatteryState) {
        *self.state.lock() = Some(state);
    }
}

#[async_trait]
impl BatteryMonitor for StaticBatteryMonitor {
    async fn battery_state(&self) -> Option<BatteryState> {
        *self.state.lock()
    }
}
