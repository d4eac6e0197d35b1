//! Settings store contract and implementations.
//!
//! The engine only ever talks to the `SettingsStore` trait. Two
//! implementations ship here: `MemorySettings` for tests and embedding, and
//! `FileSettings`, which persists the `AlertConfig` as a TOML file in the
//! user config directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use halo_types::{AlertConfig, ColorOverride, Mode};
use thiserror::Error;

/// Read side of the policy/preference store, plus the two-phase override
/// contract: `channel_color` reads `(value, user_set)`, `save_default_color`
/// writes a derived default and must no-op while a user choice is pinned.
pub trait SettingsStore: Send {
    fn is_enabled(&self) -> bool;

    /// Policy mode for the given charging/screen state.
    fn mode(&self, charging: bool, screen_on: bool) -> Mode {
        Mode::select(charging, screen_on)
    }

    fn seen_timeout_ms(&self, mode: Mode) -> i64;
    fn respect_do_not_disturb(&self) -> bool;
    fn seen_if_screen_on(&self) -> bool;
    fn seen_on_lockscreen(&self) -> bool;
    fn seen_on_user_present(&self) -> bool;
    fn seen_on_pickup(&self, mode: Mode) -> bool;

    /// Stored color for a (package, channel) pair, if any.
    fn channel_color(&self, package: &str, channel: &str) -> Option<ColorOverride>;

    /// Persist a freshly derived color as the new non-user-set default.
    /// Must not overwrite a user-set value.
    fn save_default_color(&mut self, package: &str, channel: &str, color: u32);

    /// Pin an explicit user choice for a (package, channel) pair.
    fn set_user_color(&mut self, package: &str, channel: &str, color: u32);

    /// Whether alerts are inside the configured daily window at `now`.
    /// No schedule configured means always active.
    fn in_alert_schedule(&self, now: NaiveTime) -> bool;

    /// Wall-clock time of the next schedule boundary after `now`, if a
    /// schedule is configured. Used to arm the re-evaluation alarm.
    fn next_schedule_change(&self, now: NaiveTime) -> Option<NaiveTime>;

    /// Re-read external state after a settings-changed event. No-op for
    /// in-memory stores.
    fn reload(&mut self) {}

    /// Persist deferred writes, called after each reconciliation pass.
    /// No-op for in-memory stores.
    fn persist(&mut self) {}
}

fn config_is_enabled(config: &AlertConfig) -> bool {
    config.enabled
}

fn config_in_schedule(config: &AlertConfig, now: NaiveTime) -> bool {
    match &config.schedule {
        Some(window) => window.contains(now),
        None => true,
    }
}

fn config_next_change(config: &AlertConfig, now: NaiveTime) -> Option<NaiveTime> {
    config.schedule.as_ref().map(|w| w.next_boundary_after(now))
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Settings store backed by an in-memory `AlertConfig`.
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    config: AlertConfig,
}

impl MemorySettings {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AlertConfig {
        &mut self.config
    }
}

impl SettingsStore for MemorySettings {
    fn is_enabled(&self) -> bool {
        config_is_enabled(&self.config)
    }

    fn seen_timeout_ms(&self, mode: Mode) -> i64 {
        self.config.mode_config(mode).seen_timeout_ms
    }

    fn respect_do_not_disturb(&self) -> bool {
        self.config.respect_do_not_disturb
    }

    fn seen_if_screen_on(&self) -> bool {
        self.config.seen_if_screen_on
    }

    fn seen_on_lockscreen(&self) -> bool {
        self.config.seen_on_lockscreen
    }

    fn seen_on_user_present(&self) -> bool {
        self.config.seen_on_user_present
    }

    fn seen_on_pickup(&self, mode: Mode) -> bool {
        self.config.mode_config(mode).seen_on_pickup
    }

    fn channel_color(&self, package: &str, channel: &str) -> Option<ColorOverride> {
        self.config
            .overrides
            .get(&AlertConfig::override_key(package, channel))
            .copied()
    }

    fn save_default_color(&mut self, package: &str, channel: &str, color: u32) {
        let key = AlertConfig::override_key(package, channel);
        let entry = self
            .config
            .overrides
            .entry(key)
            .or_insert(ColorOverride { color, user_set: false });
        if !entry.user_set {
            entry.color = color;
        }
    }

    fn set_user_color(&mut self, package: &str, channel: &str, color: u32) {
        self.config.overrides.insert(
            AlertConfig::override_key(package, channel),
            ColorOverride { color, user_set: true },
        );
    }

    fn in_alert_schedule(&self, now: NaiveTime) -> bool {
        config_in_schedule(&self.config, now)
    }

    fn next_schedule_change(&self, now: NaiveTime) -> Option<NaiveTime> {
        config_next_change(&self.config, now)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from loading or persisting the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

/// Settings store persisted as a TOML file.
///
/// Derived-default writes happen once per resolved notification per pass, so
/// persistence is deferred: mutations mark the store dirty and `flush` (also
/// called after each reconciliation pass) writes the file once.
#[derive(Debug)]
pub struct FileSettings {
    inner: MemorySettings,
    path: PathBuf,
    dirty: bool,
}

impl FileSettings {
    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let config = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).map_err(|e| SettingsError::Parse {
                path: path.clone(),
                source: e,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AlertConfig::default(),
            Err(e) => {
                return Err(SettingsError::Io {
                    path,
                    source: e,
                });
            }
        };
        Ok(Self {
            inner: MemorySettings::new(config),
            path,
            dirty: false,
        })
    }

    /// Default settings file location under the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("halo").join("settings.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AlertConfig {
        self.inner.config()
    }

    /// Write the config back to disk if anything changed since the last
    /// flush.
    pub fn flush(&mut self) -> Result<(), SettingsError> {
        if !self.dirty {
            return Ok(());
        }
        let text =
            toml::to_string_pretty(self.inner.config()).map_err(|e| SettingsError::Serialize {
                path: self.path.clone(),
                source: e,
            })?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&self.path, text).map_err(|e| SettingsError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        self.dirty = false;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    fn seen_timeout_ms(&self, mode: Mode) -> i64 {
        self.inner.seen_timeout_ms(mode)
    }

    fn respect_do_not_disturb(&self) -> bool {
        self.inner.respect_do_not_disturb()
    }

    fn seen_if_screen_on(&self) -> bool {
        self.inner.seen_if_screen_on()
    }

    fn seen_on_lockscreen(&self) -> bool {
        self.inner.seen_on_lockscreen()
    }

    fn seen_on_user_present(&self) -> bool {
        self.inner.seen_on_user_present()
    }

    fn seen_on_pickup(&self, mode: Mode) -> bool {
        self.inner.seen_on_pickup(mode)
    }

    fn channel_color(&self, package: &str, channel: &str) -> Option<ColorOverride> {
        self.inner.channel_color(package, channel)
    }

    fn save_default_color(&mut self, package: &str, channel: &str, color: u32) {
        let before = self.inner.channel_color(package, channel);
        self.inner.save_default_color(package, channel, color);
        if self.inner.channel_color(package, channel) != before {
            self.dirty = true;
        }
    }

    fn set_user_color(&mut self, package: &str, channel: &str, color: u32) {
        self.inner.set_user_color(package, channel, color);
        self.dirty = true;
    }

    fn in_alert_schedule(&self, now: NaiveTime) -> bool {
        self.inner.in_alert_schedule(now)
    }

    fn next_schedule_change(&self, now: NaiveTime) -> Option<NaiveTime> {
        self.inner.next_schedule_change(now)
    }

    fn reload(&mut self) {
        if self.dirty {
            // Keep unflushed derived defaults over a stale file copy
            return;
        }
        match Self::load(self.path.clone()) {
            Ok(fresh) => self.inner = fresh.inner,
            Err(e) => {
                tracing::warn!(error = %e, "failed to reload settings, keeping current");
            }
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_overwritten_once_user_set() {
        let mut settings = MemorySettings::default();
        settings.save_default_color("pkg", "chan", 0xFF00FF00);
        settings.set_user_color("pkg", "chan", 0xFF123456);
        settings.save_default_color("pkg", "chan", 0xFF0000FF);
        let stored = settings.channel_color("pkg", "chan").unwrap();
        assert_eq!(stored.color, 0xFF123456);
        assert!(stored.user_set);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = FileSettings::load(dir.path().join("settings.toml")).unwrap();
        assert!(settings.is_enabled());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("halo").join("settings.toml");

        let mut settings = FileSettings::load(&path).unwrap();
        settings.set_user_color("com.example.app", "inbox", 0xFF10A0FF);
        settings.save_default_color("com.example.app", "other", 0xFF00FF00);
        settings.flush().unwrap();

        let reloaded = FileSettings::load(&path).unwrap();
        let pinned = reloaded.channel_color("com.example.app", "inbox").unwrap();
        assert_eq!(pinned.color, 0xFF10A0FF);
        assert!(pinned.user_set);
        let derived = reloaded.channel_color("com.example.app", "other").unwrap();
        assert!(!derived.user_set);
    }

    #[test]
    fn flush_is_a_noop_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = FileSettings::load(&path).unwrap();
        settings.flush().unwrap();
        // Nothing was dirty, so no file should have been created
        assert!(!path.exists());
    }

    #[test]
    fn redundant_default_write_stays_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = FileSettings::load(&path).unwrap();
        settings.save_default_color("pkg", "chan", 0xFF00FF00);
        settings.flush().unwrap();
        assert!(path.exists());

        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        settings.save_default_color("pkg", "chan", 0xFF00FF00);
        settings.flush().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }
}
