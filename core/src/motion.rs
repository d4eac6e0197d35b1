//! Motion-triggered dismissal.
//!
//! A small state machine converting stationary-then-moving transitions into
//! "the user picked the device up and looked at it" events.

/// Device motion state reported by the sensor collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Unknown,
    Stationary,
    Moving,
}

/// Minimum stationary time before a move counts as a pickup.
pub const PICKUP_STATIONARY_MS: i64 = 10_000;

/// Tracks motion transitions and the accumulated stationary duration.
#[derive(Debug)]
pub struct MotionMonitor {
    last_state: MotionState,
    stationary_for_ms: i64,
}

impl Default for MotionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionMonitor {
    pub fn new() -> Self {
        Self {
            last_state: MotionState::Unknown,
            stationary_for_ms: 0,
        }
    }

    /// Feed one sensor callback. Returns true when this transition is a
    /// pickup dismissal: the device moved after being stationary for at
    /// least `PICKUP_STATIONARY_MS` and the current mode permits it.
    pub fn on_motion(&mut self, state: MotionState, for_ms: i64, pickup_allowed: bool) -> bool {
        if state != self.last_state {
            tracing::debug!(state = ?state, "motion transition");
            self.last_state = state;
        }

        if state == MotionState::Stationary {
            self.stationary_for_ms = for_ms;
            return false;
        }

        let pickup = state == MotionState::Moving
            && self.stationary_for_ms >= PICKUP_STATIONARY_MS
            && pickup_allowed;
        self.stationary_for_ms = 0;
        pickup
    }

    /// Reset the stationary accumulator (called whenever the published color
    /// set changes, so fresh colors get a full pickup window).
    pub fn reset_duration(&mut self) {
        self.stationary_for_ms = 0;
    }
}

/// Motion sensor collaborator. The implementation is expected to deliver
/// `HostEvent::Motion` callbacks into the service while started.
pub trait MotionSensor: Send {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Whether the sensor subscription should be active. The sensor is only
/// worth running while there is something a pickup could dismiss.
pub fn want_motion_sensor(enabled: bool, has_colors: bool, pickup_allowed: bool) -> bool {
    enabled && has_colors && pickup_allowed
}
