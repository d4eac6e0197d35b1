//! Alert policy configuration.
//!
//! These types are the serde surface of the settings store: they are loaded
//! from and saved to a TOML file by `halo-core`, and edited by whatever
//! frontend sits on top. Nothing here contains behavior beyond schedule
//! arithmetic; policy decisions live in the engine.

use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::mode::Mode;

/// A stored per-(package, channel) color.
///
/// `user_set` distinguishes an explicit user choice from a derived default.
/// Derived defaults may be silently overwritten by fresh derivations on any
/// pass; user-set values are pinned until the user changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOverride {
    /// ARGB color value.
    pub color: u32,
    /// True when the value was chosen by the user rather than derived.
    #[serde(default)]
    pub user_set: bool,
}

/// Per-mode policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// How long a seen notification keeps contributing its color, in
    /// milliseconds. Zero disables timeout expiry for this mode.
    pub seen_timeout_ms: i64,
    /// Whether a sustained-stationary-then-moving transition marks all
    /// notifications as seen in this mode.
    pub seen_on_pickup: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            seen_timeout_ms: 0,
            seen_on_pickup: false,
        }
    }
}

/// Policy table with one entry per `Mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTable {
    pub screen_off_battery: ModeConfig,
    pub screen_off_charging: ModeConfig,
    pub screen_on_battery: ModeConfig,
    pub screen_on_charging: ModeConfig,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            screen_off_battery: ModeConfig {
                seen_timeout_ms: 300_000,
                seen_on_pickup: true,
            },
            screen_off_charging: ModeConfig {
                seen_timeout_ms: 0,
                seen_on_pickup: true,
            },
            screen_on_battery: ModeConfig::default(),
            screen_on_charging: ModeConfig::default(),
        }
    }
}

impl ModeTable {
    pub fn get(&self, mode: Mode) -> ModeConfig {
        match mode {
            Mode::ScreenOffBattery => self.screen_off_battery,
            Mode::ScreenOffCharging => self.screen_off_charging,
            Mode::ScreenOnBattery => self.screen_on_battery,
            Mode::ScreenOnCharging => self.screen_on_charging,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut ModeConfig {
        match mode {
            Mode::ScreenOffBattery => &mut self.screen_off_battery,
            Mode::ScreenOffCharging => &mut self.screen_off_charging,
            Mode::ScreenOnBattery => &mut self.screen_on_battery,
            Mode::ScreenOnCharging => &mut self.screen_on_charging,
        }
    }
}

/// Daily window during which alert colors may be shown while the screen is
/// off. A window that ends before it starts wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleConfig {
    /// Whether `t` falls inside the window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t < self.end
        } else {
            // Wraps midnight, e.g. 22:00 - 07:00
            t >= self.start || t < self.end
        }
    }

    /// The next boundary (start or end) strictly after `t`, in wall-clock
    /// order. Wraps to the earliest boundary when `t` is past both.
    pub fn next_boundary_after(&self, t: NaiveTime) -> NaiveTime {
        let mut boundaries = [self.start, self.end];
        boundaries.sort();
        for b in boundaries {
            if b > t {
                return b;
            }
        }
        boundaries[0]
    }
}

/// Top-level alert policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Master switch: when false the overlay is unconditionally hidden.
    pub enabled: bool,
    /// Suppress colors while the system do-not-disturb level is nonzero.
    pub respect_do_not_disturb: bool,
    /// Mark notifications seen while the screen is interactive.
    pub seen_if_screen_on: bool,
    /// Mark all seen when the lockscreen comes up.
    pub seen_on_lockscreen: bool,
    /// Mark all seen when the user unlocks the device.
    pub seen_on_user_present: bool,
    /// Per-mode policy table.
    pub modes: ModeTable,
    /// Optional daily alert window. Absent means always active.
    pub schedule: Option<ScheduleConfig>,
    /// Stored colors keyed `"package:channel"`.
    pub overrides: HashMap<String, ColorOverride>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            respect_do_not_disturb: true,
            seen_if_screen_on: true,
            seen_on_lockscreen: true,
            seen_on_user_present: true,
            modes: ModeTable::default(),
            schedule: None,
            overrides: HashMap::new(),
        }
    }
}

impl AlertConfig {
    /// Policy for `mode`.
    pub fn mode_config(&self, mode: Mode) -> ModeConfig {
        self.modes.get(mode)
    }

    /// Stable override key for a (package, channel) pair.
    pub fn override_key(package: &str, channel: &str) -> String {
        format!("{package}:{channel}")
    }
}
