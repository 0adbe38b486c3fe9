//! The session controller: owner of the walking-session state machine.
//!
//! All sensor events and all lifecycle commands converge on one `mpsc`
//! queue drained by a single actor task, the only writer of
//! [`WalkingSessionState`]. Adapters run as independent producers behind
//! broadcast subscriptions; per-adapter forwarder tasks push their events
//! into the queue in arrival order. Lifecycle commands travel through the
//! same queue with a oneshot acknowledgement, which makes pause/resume
//! atomic with respect to raw-counter offset capture: no step tick can be
//! processed between capturing the pause point and committing `Paused`.
//!
//! State machine: `Idle → Tracking → {Paused ⇄ Tracking} → Stopped`. A
//! stopped controller cannot be restarted; a new session needs a new
//! controller.
//!
//! Observability: the current state is published on a `watch` channel (a
//! late subscriber sees only the latest value), validation decisions and
//! lifecycle events on a `broadcast` channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use stridetrack_core::{
    AccelerometerSource, ActivityClassifierSource, ActivityObservation, BatteryMonitor,
    BatteryState, LocationSample, PollingConfig, PositioningSource, RawAccelSample,
    SensorAvailability, SessionStatus, StepCounterSource, ValidationDecision,
    WalkingSessionState,
};
use stridetrack_signal::{
    LocationFilter, LocationFilterConfig, MovementStabilizer, Odometer, StabilizerConfig,
};

use crate::gate::{GateConfig, GpsEvidence, StepValidationGate};
use crate::polling::{PollingPolicy, PollingPolicyConfig};
use crate::reconciler::StepReconciler;
use crate::{Result, SessionError};

/// Configuration for the session controller and its components.
#[derive(Debug, Clone)]
pub struct SessionControllerConfig {
    /// Movement stabilizer thresholds
    pub stabilizer: StabilizerConfig,
    /// Location filter thresholds
    pub location_filter: LocationFilterConfig,
    /// Validation gate thresholds
    pub gate: GateConfig,
    /// Adaptive polling tunables
    pub polling: PollingPolicyConfig,
    /// Cadence of the battery state check
    pub battery_poll_interval: Duration,
    /// Capacity of the serialized event queue
    pub queue_capacity: usize,
    /// Capacity of the observability event channel
    pub event_capacity: usize,
}

impl Default for SessionControllerConfig {
    fn default() -> Self {
        Self {
            stabilizer: StabilizerConfig::default(),
            location_filter: LocationFilterConfig::default(),
            gate: GateConfig::default(),
            polling: PollingPolicyConfig::default(),
            battery_poll_interval: Duration::from_secs(60),
            queue_capacity: 256,
            event_capacity: 64,
        }
    }
}

/// Observability events emitted alongside the state stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Session entered Tracking
    Started,
    /// Session entered Paused
    Paused,
    /// Session returned to Tracking
    Resumed,
    /// Session entered Stopped
    Stopped,
    /// The gate decided on a step delta
    Decision(ValidationDecision),
}

/// Async stream over [`SessionEvent`]s.
pub struct SessionEventStream {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionEventStream {
    /// Receive the next event, skipping over lagged gaps.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "session event stream lagged");
                }
            }
        }
    }
}

/// Inputs serialized through the aggregation queue.
enum Input {
    RawSteps(u64),
    Accel(RawAccelSample),
    Activity(ActivityObservation),
    Fix(LocationSample),
    Pause(oneshot::Sender<Result<()>>),
    Resume(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
}

/// Top-level orchestrator of one walking session.
///
/// Sensor sources are injected at construction; the controller owns their
/// subscription lifetime from `start()` to `stop()`.
pub struct SessionController {
    config: SessionControllerConfig,
    steps: Arc<dyn StepCounterSource>,
    accel: Arc<dyn AccelerometerSource>,
    activity: Arc<dyn ActivityClassifierSource>,
    positioning: Arc<dyn PositioningSource>,
    battery: Arc<dyn BatteryMonitor>,
    /// Handed to the actor on start; `None` afterwards
    state_tx: Option<watch::Sender<WalkingSessionState>>,
    state_rx: watch::Receiver<WalkingSessionState>,
    events_tx: broadcast::Sender<SessionEvent>,
    input_tx: Option<mpsc::Sender<Input>>,
    actor: Option<JoinHandle<()>>,
    forwarders: Vec<JoinHandle<()>>,
}

impl SessionController {
    /// Create a controller over the injected sensor sources.
    pub fn new(
        config: SessionControllerConfig,
        steps: Arc<dyn StepCounterSource>,
        accel: Arc<dyn AccelerometerSource>,
        activity: Arc<dyn ActivityClassifierSource>,
        positioning: Arc<dyn PositioningSource>,
        battery: Arc<dyn BatteryMonitor>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(WalkingSessionState::default());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            steps,
            accel,
            activity,
            positioning,
            battery,
            state_tx: Some(state_tx),
            state_rx,
            events_tx,
            input_tx: None,
            actor: None,
            forwarders: Vec::new(),
        }
    }

    /// Availability snapshot across the injected sources.
    #[must_use]
    pub fn availability(&self) -> SensorAvailability {
        SensorAvailability {
            step_counter: self.steps.is_available(),
            accelerometer: self.accel.is_available(),
            activity_classifier: self.activity.is_available(),
            positioning: self.positioning.is_available(),
        }
    }

    /// Current session status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state_rx.borrow().status
    }

    /// True while the session is in `Tracking`.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.status() == SessionStatus::Tracking
    }

    /// Snapshot of the current session state.
    #[must_use]
    pub fn state(&self) -> WalkingSessionState {
        self.state_rx.borrow().clone()
    }

    /// Latest-value stream of session state snapshots.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<WalkingSessionState> {
        self.state_rx.clone()
    }

    /// Subscribe to decision and lifecycle events.
    #[must_use]
    pub fn events(&self) -> SessionEventStream {
        SessionEventStream {
            receiver: self.events_tx.subscribe(),
        }
    }

    /// Start tracking: reset state, subscribe to all sources, enter `Tracking`.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::SensorUnavailable`] when the step counter is
    /// missing, and [`SessionError::InvalidTransition`] when not `Idle`.
    pub async fn start(&mut self) -> Result<()> {
        let status = self.status();
        if status != SessionStatus::Idle {
            return Err(SessionError::InvalidTransition {
                from: status,
                to: SessionStatus::Tracking,
            });
        }
        if !self.steps.is_available() {
            return Err(SessionError::SensorUnavailable { sensor: "step counter" });
        }

        let state_tx = self.state_tx.take().ok_or(SessionError::ControllerGone)?;
        let (input_tx, input_rx) = mpsc::channel(self.config.queue_capacity.max(1));

        self.forwarders = vec![
            spawn_forwarder(self.steps.subscribe(), input_tx.clone(), Input::RawSteps, "steps"),
            spawn_forwarder(self.accel.subscribe(), input_tx.clone(), Input::Accel, "accelerometer"),
            spawn_forwarder(self.activity.subscribe(), input_tx.clone(), Input::Activity, "activity"),
            spawn_forwarder(self.positioning.subscribe(), input_tx.clone(), Input::Fix, "positioning"),
        ];

        let mut state = WalkingSessionState::default();
        state.status = SessionStatus::Tracking;
        state.started_at = Some(Utc::now());
        state_tx.send_replace(state.clone());
        let _ = self.events_tx.send(SessionEvent::Started);
        tracing::info!("walking session started");

        let mut actor = Actor {
            state,
            state_tx,
            events_tx: self.events_tx.clone(),
            stabilizer: MovementStabilizer::new(self.config.stabilizer),
            filter: LocationFilter::new(self.config.location_filter),
            odometer: Odometer::new(),
            reconciler: StepReconciler::new(),
            gate: StepValidationGate::new(self.config.gate),
            policy: PollingPolicy::new(self.config.polling),
            positioning: Arc::clone(&self.positioning),
            battery: Arc::clone(&self.battery),
            last_battery: None,
            applied_polling: None,
            distance_at_last_tick: 0.0,
            gps_seen: false,
        };

        // Initial positioning request from the starting conditions.
        actor.last_battery = actor.battery.battery_state().await;
        actor.reapply_polling();

        let battery_poll = self.config.battery_poll_interval.max(Duration::from_millis(100));
        self.actor = Some(tokio::spawn(actor.run(input_rx, battery_poll)));
        self.input_tx = Some(input_tx);
        Ok(())
    }

    /// Pause accrual. Valid only from `Tracking`.
    pub async fn pause(&self) -> Result<()> {
        self.command(SessionStatus::Paused, Input::Pause).await
    }

    /// Resume accrual. Valid only from `Paused`.
    pub async fn resume(&self) -> Result<()> {
        self.command(SessionStatus::Tracking, Input::Resume).await
    }

    /// Stop the session: unsubscribe all producers, flush a final
    /// distance/speed update, enter `Stopped`.
    ///
    /// No events are processed after this returns. The controller cannot be
    /// restarted.
    pub async fn stop(&mut self) -> Result<()> {
        let input_tx = self.input_tx.as_ref().ok_or(SessionError::InvalidTransition {
            from: self.status(),
            to: SessionStatus::Stopped,
        })?;

        // Unsubscribe producers before the final flush.
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        input_tx
            .send(Input::Stop(ack_tx))
            .await
            .map_err(|_| SessionError::ControllerGone)?;
        let result = ack_rx.await.map_err(|_| SessionError::ControllerGone)?;

        self.input_tx = None;
        if let Some(actor) = self.actor.take() {
            let _ = actor.await;
        }
        result
    }

    async fn command(
        &self,
        to: SessionStatus,
        make: fn(oneshot::Sender<Result<()>>) -> Input,
    ) -> Result<()> {
        let input_tx = self
            .input_tx
            .as_ref()
            .ok_or(SessionError::InvalidTransition { from: self.status(), to })?;
        let (ack_tx, ack_rx) = oneshot::channel();
        input_tx
            .send(make(ack_tx))
            .await
            .map_err(|_| SessionError::ControllerGone)?;
        ack_rx.await.map_err(|_| SessionError::ControllerGone)?
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
    }
}

/// Spawn a task draining one broadcast subscription into the queue.
fn spawn_forwarder<T: Clone + Send + 'static>(
    mut rx: broadcast::Receiver<T>,
    tx: mpsc::Sender<Input>,
    wrap: fn(T) -> Input,
    source: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(value) => {
                    if tx.send(wrap(value)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(source, lagged = n, "sensor events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

enum Flow {
    Continue,
    Stop,
}

/// The single-writer aggregation task.
struct Actor {
    state: WalkingSessionState,
    state_tx: watch::Sender<WalkingSessionState>,
    events_tx: broadcast::Sender<SessionEvent>,
    stabilizer: MovementStabilizer,
    filter: LocationFilter,
    odometer: Odometer,
    reconciler: StepReconciler,
    gate: StepValidationGate,
    policy: PollingPolicy,
    positioning: Arc<dyn PositioningSource>,
    battery: Arc<dyn BatteryMonitor>,
    last_battery: Option<BatteryState>,
    applied_polling: Option<PollingConfig>,
    /// Cumulative distance at the previous step tick, for the gate's
    /// displacement window
    distance_at_last_tick: f64,
    /// Whether any fix has ever been accepted this session
    gps_seen: bool,
}

impl Actor {
    async fn run(mut self, mut inputs: mpsc::Receiver<Input>, battery_poll: Duration) {
        let mut battery_tick = interval_at(Instant::now() + battery_poll, battery_poll);
        battery_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe = inputs.recv() => match maybe {
                    Some(input) => {
                        if matches!(self.handle(input), Flow::Stop) {
                            break;
                        }
                    }
                    // Every producer and the controller handle are gone.
                    None => break,
                },
                _ = battery_tick.tick() => self.refresh_battery().await,
            }
        }
        tracing::debug!("session actor ended");
    }

    fn handle(&mut self, input: Input) -> Flow {
        match input {
            Input::Accel(sample) => {
                let movement = self.stabilizer.push(&sample);
                if movement != self.state.movement {
                    self.state.movement = movement;
                    self.publish();
                }
            }
            Input::Activity(observation) => {
                let kind_changed = observation.kind != self.state.activity.kind;
                self.state.activity = observation;
                if kind_changed {
                    self.reapply_polling();
                }
                self.publish();
            }
            Input::RawSteps(raw) => {
                let now_ms = Utc::now().timestamp_millis();
                if let Some(delta) = self.reconciler.observe(raw, now_ms) {
                    let gps = self.gps_evidence();
                    let decision = self.gate.evaluate(
                        self.state.movement,
                        self.state.activity,
                        gps,
                        &delta,
                    );
                    self.distance_at_last_tick = self.odometer.distance_m();
                    if let ValidationDecision::Accepted { delta } = decision {
                        self.state.validated_steps += u64::from(delta);
                        self.odometer.record_steps(self.state.validated_steps);
                        self.publish();
                    } else {
                        tracing::debug!(?decision, "step delta rejected");
                    }
                    let _ = self.events_tx.send(SessionEvent::Decision(decision));
                }
            }
            Input::Fix(fix) => {
                if self.filter.offer(&fix, self.state.activity.kind).is_accepted() {
                    self.odometer.record_fix(&fix);
                    self.gps_seen = true;
                    self.state.route.push(fix);
                    self.state.distance_m = self.odometer.distance_m();
                    self.state.speed_mps = self.odometer.speed_mps();
                    self.publish();
                }
            }
            Input::Pause(ack) => {
                if self.state.status != SessionStatus::Tracking {
                    let _ = ack.send(Err(SessionError::InvalidTransition {
                        from: self.state.status,
                        to: SessionStatus::Paused,
                    }));
                } else {
                    // Offset capture and status commit happen in one handler:
                    // no raw tick can land in between.
                    self.reconciler.pause();
                    self.state.status = SessionStatus::Paused;
                    self.publish();
                    let _ = self.events_tx.send(SessionEvent::Paused);
                    tracing::info!("walking session paused");
                    let _ = ack.send(Ok(()));
                }
            }
            Input::Resume(ack) => {
                if self.state.status != SessionStatus::Paused {
                    let _ = ack.send(Err(SessionError::InvalidTransition {
                        from: self.state.status,
                        to: SessionStatus::Tracking,
                    }));
                } else {
                    self.reconciler.resume();
                    self.state.status = SessionStatus::Tracking;
                    self.publish();
                    let _ = self.events_tx.send(SessionEvent::Resumed);
                    tracing::info!(
                        excluded = self.reconciler.exclusion_offset(),
                        "walking session resumed"
                    );
                    let _ = ack.send(Ok(()));
                }
            }
            Input::Stop(ack) => {
                if !self.state.status.is_live() {
                    let _ = ack.send(Err(SessionError::InvalidTransition {
                        from: self.state.status,
                        to: SessionStatus::Stopped,
                    }));
                } else {
                    self.odometer.finalize();
                    self.state.distance_m = self.odometer.distance_m();
                    self.state.speed_mps = self.odometer.speed_mps();
                    self.state.status = SessionStatus::Stopped;
                    self.state.stopped_at = Some(Utc::now());
                    self.publish();
                    let _ = self.events_tx.send(SessionEvent::Stopped);
                    tracing::info!(
                        steps = self.state.validated_steps,
                        distance_m = self.state.distance_m,
                        "walking session stopped"
                    );
                    let _ = ack.send(Ok(()));
                    return Flow::Stop;
                }
            }
        }
        Flow::Continue
    }

    /// GPS evidence for the gate, or `None` before any accepted fix
    /// (step-only degradation: the displacement rule is skipped).
    fn gps_evidence(&self) -> Option<GpsEvidence> {
        if !self.gps_seen {
            return None;
        }
        Some(GpsEvidence {
            moved_m: self.odometer.distance_m() - self.distance_at_last_tick,
            speed_mps: self.odometer.speed_mps(),
        })
    }

    async fn refresh_battery(&mut self) {
        let current = self.battery.battery_state().await;
        if current != self.last_battery {
            tracing::debug!(?current, "battery state changed");
            self.last_battery = current;
            self.reapply_polling();
        }
    }

    fn reapply_polling(&mut self) {
        let computed = self.policy.compute(self.state.activity.kind, self.last_battery);
        if self.applied_polling != Some(computed) {
            tracing::info!(
                interval_ms = computed.interval_ms,
                priority = ?computed.priority,
                "adaptive polling reconfigured"
            );
            self.positioning.apply_config(computed);
            self.applied_polling = Some(computed);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
