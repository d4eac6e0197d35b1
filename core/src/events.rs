//! Inbound host events.
//!
//! Every callback-shaped input (notification listener callbacks, broadcast
//! receivers, content observers, sensor listeners, timer fires) is folded
//! into one event enum consumed by the service's debounce queue.

use crate::motion::MotionState;

/// An external event delivered to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A notification was posted or updated.
    NotificationPosted,
    /// A notification was removed or dismissed.
    NotificationRemoved,
    /// A notification channel or channel group was modified.
    ChannelModified,
    /// The host re-ranked notifications.
    RankingUpdate,
    /// The persisted settings changed (any source).
    SettingsChanged,
    /// The system do-not-disturb filter changed.
    InterruptionFilterChanged,
    ScreenOn,
    ScreenOff,
    /// The user unlocked the device.
    UserPresent,
    /// Motion sensor callback.
    Motion { state: MotionState, for_ms: i64 },
    /// A previously armed seen-timeout fired.
    TimeoutFired,
    /// The schedule-boundary alarm fired.
    ScheduleAlarm,
    /// Explicit "re-evaluate now" request from a collaborator.
    Refresh,
    /// The host tore down the listener connection.
    Disconnected,
}

impl HostEvent {
    /// Whether this event requests a (debounced) reconciliation pass by
    /// itself. Events returning `false` here are handled specially by the
    /// service and may still trigger a pass conditionally.
    pub fn triggers_reconcile(&self) -> bool {
        match self {
            HostEvent::NotificationPosted
            | HostEvent::NotificationRemoved
            | HostEvent::ChannelModified
            | HostEvent::RankingUpdate
            | HostEvent::SettingsChanged
            | HostEvent::InterruptionFilterChanged
            | HostEvent::TimeoutFired
            | HostEvent::ScheduleAlarm
            | HostEvent::Refresh => true,
            HostEvent::ScreenOn
            | HostEvent::ScreenOff
            | HostEvent::UserPresent
            | HostEvent::Motion { .. }
            | HostEvent::Disconnected => false,
        }
    }
}
