//! Debounced service loop.
//!
//! Owns the engine, all collaborators, and every timer. Host callbacks are
//! folded into `HostEvent`s on an mpsc channel; the loop coalesces bursts of
//! events into at most one reconciliation pass per debounce window and arms
//! one-shot deadlines for seen-timeout expiry and schedule boundaries.
//!
//! Exactly one task runs passes, so the engine needs no internal locking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::engine::Engine;
use crate::events::HostEvent;
use crate::host::{EnvironmentProbe, NotificationSource, OverlayRenderer};
use crate::motion::{MotionMonitor, MotionSensor};
use crate::record::ActiveNotification;
use crate::settings::SettingsStore;

/// Event bursts within this window collapse into a single pass.
pub const DEBOUNCE_MS: u64 = 100;

const EVENT_QUEUE_DEPTH: usize = 64;

/// Everything the service needs from the host, bundled for `connect`.
pub struct Collaborators {
    pub source: Box<dyn NotificationSource>,
    pub settings: Box<dyn SettingsStore>,
    pub environment: Box<dyn EnvironmentProbe>,
    pub renderer: Box<dyn OverlayRenderer>,
    pub sensor: Box<dyn MotionSensor>,
}

#[derive(Debug, Default)]
struct SharedState {
    active: RwLock<Vec<ActiveNotification>>,
    colors: RwLock<Vec<u32>>,
}

/// Cheap clonable handle for feeding events in and reading snapshots out.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<HostEvent>,
    shared: Arc<SharedState>,
}

impl ServiceHandle {
    /// Deliver a host event. Silently dropped once the service has shut
    /// down.
    pub async fn send(&self, event: HostEvent) {
        if self.tx.send(event).await.is_err() {
            tracing::debug!("event dropped, service is gone");
        }
    }

    /// Snapshot of the notifications that survived the last pass.
    pub async fn active_notifications(&self) -> Vec<ActiveNotification> {
        self.shared.active.read().await.clone()
    }

    /// The color set published by the last pass.
    pub async fn current_colors(&self) -> Vec<u32> {
        self.shared.colors.read().await.clone()
    }
}

/// A running service instance.
pub struct Service {
    handle: ServiceHandle,
    task: JoinHandle<()>,
}

impl Service {
    /// Start the service loop on the current runtime. A first pass is
    /// scheduled immediately (debounced) to pick up whatever is already
    /// live.
    pub fn connect(own_package: impl Into<String>, collaborators: Collaborators) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let shared = Arc::new(SharedState::default());
        let worker = Worker::new(own_package.into(), collaborators, Arc::clone(&shared));
        let task = tokio::spawn(worker.run(rx));
        Self {
            handle: ServiceHandle { tx, shared },
            task,
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Tear the service down: hides the overlay, stops the sensor, forgets
    /// all tracked state.
    pub async fn shutdown(self) {
        self.handle.send(HostEvent::Disconnected).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "service task did not shut down cleanly");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker loop
// ─────────────────────────────────────────────────────────────────────────────

struct Worker {
    engine: Engine,
    motion: MotionMonitor,
    collab: Collaborators,
    shared: Arc<SharedState>,
    /// Wall-clock time captured at startup; the current time is derived
    /// from it plus elapsed runtime time, so passes and armed deadlines
    /// share one clock.
    epoch_wall: NaiveDateTime,
    epoch_instant: Instant,
    /// The device is unlocked and in front of the user.
    user_present: bool,
    sensor_running: bool,
    /// Pending debounced pass.
    pass_due: Option<Instant>,
    /// Armed seen-timeout re-pass.
    timeout_due: Option<Instant>,
    /// Armed schedule-boundary re-pass.
    schedule_due: Option<Instant>,
}

/// Sleep until an optional deadline; no deadline means wait forever. Keeps
/// `select!` branches free of disabled-branch guards, which would still
/// evaluate the sleep expression.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

impl Worker {
    fn new(own_package: String, collab: Collaborators, shared: Arc<SharedState>) -> Self {
        let enabled = collab.settings.is_enabled();
        Self {
            engine: Engine::new(own_package, enabled),
            motion: MotionMonitor::new(),
            collab,
            shared,
            epoch_wall: Utc::now().naive_utc(),
            epoch_instant: Instant::now(),
            user_present: false,
            sensor_running: false,
            pass_due: None,
            timeout_due: None,
            schedule_due: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<HostEvent>) {
        let env = self.collab.environment.snapshot();
        self.user_present = env.screen.is_on() && !env.keyguard_locked;
        self.engine.clear_tracker();
        self.bump();
        tracing::info!("service connected");

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    if !self.handle_event(event) {
                        break;
                    }
                }
                _ = wait_until(self.pass_due) => {
                    self.pass_due = None;
                    self.run_pass().await;
                }
                _ = wait_until(self.timeout_due) => {
                    self.timeout_due = None;
                    tracing::debug!("seen-timeout fired");
                    self.bump();
                }
                _ = wait_until(self.schedule_due) => {
                    self.schedule_due = None;
                    tracing::debug!("schedule boundary reached");
                    self.bump();
                }
            }
        }

        self.teardown().await;
    }

    /// Schedule a debounced pass. A trigger while one is already pending
    /// supersedes it and restarts the window, so a sustained storm runs a
    /// single pass once it quiets down.
    fn bump(&mut self) {
        self.pass_due = Some(Instant::now() + Duration::from_millis(DEBOUNCE_MS));
    }

    /// Returns false when the loop should exit.
    fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::Disconnected => return false,
            HostEvent::ScreenOff => {
                self.user_present = false;
                self.bump();
            }
            HostEvent::ScreenOn => {
                let env = self.collab.environment.snapshot();
                if env.keyguard_locked && self.collab.settings.seen_on_lockscreen() {
                    self.engine.mark_all_as_seen();
                }
                self.bump();
            }
            HostEvent::UserPresent => {
                self.user_present = true;
                if self.collab.settings.seen_on_user_present() {
                    self.engine.mark_all_as_seen();
                }
                self.bump();
            }
            HostEvent::Motion { state, for_ms } => {
                // Pickup policy is judged by whether the user is already
                // looking at the device, not by the doze screen state
                let env = self.collab.environment.snapshot();
                let mode = self.collab.settings.mode(env.charging, self.user_present);
                let pickup_allowed = self.collab.settings.seen_on_pickup(mode);
                if self.motion.on_motion(state, for_ms, pickup_allowed) {
                    tracing::debug!("pickup detected, marking all as seen");
                    self.engine.mark_all_as_seen();
                    self.bump();
                }
            }
            HostEvent::SettingsChanged => {
                self.collab.settings.reload();
                self.engine
                    .set_enabled(self.collab.settings.is_enabled(), self.collab.renderer.as_mut());
                self.bump();
            }
            other if other.triggers_reconcile() => self.bump(),
            other => {
                tracing::debug!(event = ?other, "ignored");
            }
        }
        true
    }

    fn now(&self) -> NaiveDateTime {
        let elapsed = Instant::now() - self.epoch_instant;
        let elapsed = chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        self.epoch_wall + elapsed
    }

    async fn run_pass(&mut self) {
        let env = self.collab.environment.snapshot();
        let now = self.now();

        let outcome = self.engine.reconcile(
            now,
            self.collab.source.as_mut(),
            self.collab.settings.as_mut(),
            env,
            self.user_present,
            self.collab.renderer.as_mut(),
            &mut self.motion,
        );
        self.collab.settings.persist();

        *self.shared.active.write().await = self.engine.active_notifications();
        *self.shared.colors.write().await = self.engine.current_colors().to_vec();

        self.timeout_due = outcome
            .reschedule_after_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms.max(0) as u64));
        self.schedule_due = self.next_schedule_deadline(now);

        if outcome.want_motion_sensor != self.sensor_running {
            self.sensor_running = outcome.want_motion_sensor;
            if self.sensor_running {
                tracing::debug!("starting motion sensor");
                self.collab.sensor.start();
            } else {
                tracing::debug!("stopping motion sensor");
                self.collab.sensor.stop();
            }
        }
    }

    /// Milliseconds until the next schedule boundary, converted to a
    /// deadline. Boundaries behind the current time of day wrap to
    /// tomorrow.
    fn next_schedule_deadline(&self, now: NaiveDateTime) -> Option<Instant> {
        let boundary = self.collab.settings.next_schedule_change(now.time())?;
        let mut delta = boundary - now.time();
        if delta <= chrono::Duration::zero() {
            delta += chrono::Duration::days(1);
        }
        let ms = delta.num_milliseconds().max(0) as u64;
        Some(Instant::now() + Duration::from_millis(ms))
    }

    async fn teardown(&mut self) {
        tracing::info!("service disconnecting");
        self.collab.renderer.hide(true);
        self.engine.clear_tracker();
        if self.sensor_running {
            self.collab.sensor.stop();
            self.sensor_running = false;
        }
        self.collab.settings.persist();
        self.shared.active.write().await.clear();
        self.shared.colors.write().await.clear();
    }
}
