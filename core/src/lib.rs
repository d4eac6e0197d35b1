pub mod color;
pub mod engine;
pub mod events;
pub mod host;
pub mod motion;
pub mod record;
pub mod service;
pub mod settings;
pub mod tracker;


// Re-exports for convenience
pub use engine::{Engine, PassOutcome};
pub use events::HostEvent;
pub use host::{
    EnvSnapshot, EnvironmentProbe, NotificationSource, OverlayRenderer, QueryError, ScreenState,
};
pub use motion::{MotionMonitor, MotionSensor, MotionState};
pub use record::{ActiveNotification, NotificationRecord};
pub use service::{Collaborators, Service, ServiceHandle};
pub use settings::{FileSettings, MemorySettings, SettingsError, SettingsStore};
pub use tracker::NotificationTracker;
