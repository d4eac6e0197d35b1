//! Contracts for the host-side collaborators.
//!
//! The engine never talks to a platform directly; everything it needs from
//! the outside world comes through these traits, which makes the whole
//! reconciliation path testable with plain fakes.

use thiserror::Error;

use crate::record::NotificationRecord;

/// Failure reading the live notification set. The engine tolerates these by
/// treating the pass as having zero live notifications.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The host revoked the listener's permission (e.g. companion-device
    /// association was removed).
    #[error("notification listener permission denied")]
    PermissionDenied,
    #[error("notification source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the full current set of live notifications.
pub trait NotificationSource: Send {
    fn list_live(&mut self) -> Result<Vec<NotificationRecord>, QueryError>;
}

/// Screen power state as seen by the environment probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Interactive, fully lit.
    On,
    /// Dimmed always-on display.
    Doze,
    Off,
}

impl ScreenState {
    pub fn is_on(self) -> bool {
        self == ScreenState::On
    }

    pub fn is_off(self) -> bool {
        self == ScreenState::Off
    }
}

/// Environmental gate inputs, polled once at the start of every pass.
#[derive(Debug, Clone, Copy)]
pub struct EnvSnapshot {
    pub charging: bool,
    pub screen: ScreenState,
    /// System do-not-disturb level; zero means off.
    pub zen_level: i32,
    pub keyguard_locked: bool,
}

/// Read-only oracle over the device environment.
pub trait EnvironmentProbe: Send {
    fn snapshot(&self) -> EnvSnapshot;
}

/// The rendering collaborator that paints the color set.
///
/// An empty `show` is a valid "nothing to display" publish and is
/// equivalent to a hide.
pub trait OverlayRenderer: Send {
    fn show(&mut self, colors: &[u32]);
    fn hide(&mut self, immediate: bool);
}
