//! Simulated device collaborators for the demo scenario.
//!
//! Everything is backed by `Arc<Mutex<..>>` so the scenario script can
//! mutate device state while the service owns the collaborator boxes.

use std::sync::{Arc, Mutex};

use halo_core::{
    EnvSnapshot, EnvironmentProbe, MotionSensor, NotificationRecord, NotificationSource,
    OverlayRenderer, QueryError, ScreenState,
};

/// In-memory stand-in for the host's live notification list.
#[derive(Clone, Default)]
pub struct SimNotifications(Arc<Mutex<Vec<NotificationRecord>>>);

impl SimNotifications {
    /// Post or update a notification; same key replaces.
    pub fn post(&self, record: NotificationRecord) {
        let mut list = self.0.lock().unwrap();
        list.retain(|r| r.key != record.key);
        list.push(record);
    }

    pub fn dismiss(&self, key: &str) {
        self.0.lock().unwrap().retain(|r| r.key != key);
    }
}

impl NotificationSource for SimNotifications {
    fn list_live(&mut self) -> Result<Vec<NotificationRecord>, QueryError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// Mutable device environment.
#[derive(Clone)]
pub struct SimEnvironment(Arc<Mutex<EnvSnapshot>>);

impl SimEnvironment {
    pub fn new(screen: ScreenState) -> Self {
        Self(Arc::new(Mutex::new(EnvSnapshot {
            charging: false,
            screen,
            zen_level: 0,
            keyguard_locked: true,
        })))
    }

    pub fn set_screen(&self, screen: ScreenState) {
        self.0.lock().unwrap().screen = screen;
    }

    pub fn set_locked(&self, locked: bool) {
        self.0.lock().unwrap().keyguard_locked = locked;
    }

    pub fn set_zen(&self, level: i32) {
        self.0.lock().unwrap().zen_level = level;
    }
}

impl EnvironmentProbe for SimEnvironment {
    fn snapshot(&self) -> EnvSnapshot {
        *self.0.lock().unwrap()
    }
}

/// Prints each published color set to stdout.
pub struct ConsoleOverlay;

impl OverlayRenderer for ConsoleOverlay {
    fn show(&mut self, colors: &[u32]) {
        if colors.is_empty() {
            println!("[overlay] dark");
        } else {
            let list = colors
                .iter()
                .map(|c| format!("#{c:08X}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("[overlay] {list}");
        }
    }

    fn hide(&mut self, immediate: bool) {
        if immediate {
            println!("[overlay] hidden");
        } else {
            println!("[overlay] fading out");
        }
    }
}

/// Sensor stub; the scenario injects motion events directly.
#[derive(Clone, Default)]
pub struct SimSensor(Arc<Mutex<bool>>);

impl SimSensor {
    pub fn is_running(&self) -> bool {
        *self.0.lock().unwrap()
    }
}

impl MotionSensor for SimSensor {
    fn start(&mut self) {
        *self.0.lock().unwrap() = true;
        tracing::info!("motion sensor subscribed");
    }

    fn stop(&mut self) {
        *self.0.lock().unwrap() = false;
        tracing::info!("motion sensor unsubscribed");
    }
}
