//! Arbitration engine: the reconciliation pass.
//!
//! One pass pulls the live notification set, prunes the tracker, resolves
//! colors, applies gating policy, and publishes the resulting color set to
//! the overlay when (and only when) it changed. The pass is synchronous and
//! infallible; all scheduling and mutual exclusion lives in the service
//! layer.

use chrono::NaiveDateTime;

use crate::color::{self, ResolvedColor};
use crate::host::{EnvSnapshot, NotificationSource, OverlayRenderer, ScreenState};
use crate::motion::{self, MotionMonitor};
use crate::record::ActiveNotification;
use crate::settings::SettingsStore;
use crate::tracker::NotificationTracker;

/// What a reconciliation pass decided, for the scheduler's benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    /// The published color set changed this pass.
    pub changed: bool,
    /// Re-run a pass after this many milliseconds so seen-timeouts expire
    /// even without new events. Set when the color set is non-empty and the
    /// mode has a positive timeout.
    pub reschedule_after_ms: Option<i64>,
    /// Whether the motion sensor subscription should be active now.
    pub want_motion_sensor: bool,
}

/// Holds the engine's pass-to-pass state: the notification tracker, the last
/// published color set, and the active-notification snapshot.
#[derive(Debug)]
pub struct Engine {
    own_package: String,
    tracker: NotificationTracker,
    current_colors: Vec<u32>,
    active: Vec<ActiveNotification>,
    enabled: bool,
}

impl Engine {
    pub fn new(own_package: impl Into<String>, enabled: bool) -> Self {
        Self {
            own_package: own_package.into(),
            tracker: NotificationTracker::new(),
            current_colors: Vec::new(),
            active: Vec::new(),
            enabled,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// A failed notification query is treated as zero live notifications;
    /// the rest of the pass still runs, so dismissal/expiry keeps working.
    /// `user_present` is the service's unlocked-and-interacting state; it
    /// drives the pickup policy independently of the display state.
    pub fn reconcile(
        &mut self,
        now: NaiveDateTime,
        source: &mut dyn NotificationSource,
        settings: &mut dyn SettingsStore,
        env: EnvSnapshot,
        user_present: bool,
        renderer: &mut dyn OverlayRenderer,
        motion: &mut MotionMonitor,
    ) -> PassOutcome {
        let now_ms = now.and_utc().timestamp_millis();

        // Doze is the only screen-off display state for mode purposes; a
        // fully dark panel runs under the awake policy
        let mode = settings.mode(env.charging, !matches!(env.screen, ScreenState::Doze));
        // Pickup dismissal is judged by user presence, not the display:
        // a lit lockscreen still counts as a pickup-eligible state
        let pickup_mode = settings.mode(env.charging, user_present);
        let timeout_ms = settings.seen_timeout_ms(mode);
        let dnd = settings.respect_do_not_disturb() && env.zen_level > 0;
        // The screen being lit always allows a repaint, schedule or not
        let schedule_active = settings.in_alert_schedule(now.time()) || !env.screen.is_off();
        let force_mark_seen = env.screen.is_on() && settings.seen_if_screen_on();

        let live = match source.list_live() {
            Ok(records) => records,
            Err(e) => {
                tracing::debug!(error = %e, "live query failed, reconciling empty set");
                Vec::new()
            }
        };

        let survivors = self.tracker.prune(live, force_mark_seen, timeout_ms, now_ms);

        let mut colors: Vec<u32> = Vec::new();
        self.active.clear();
        for record in &survivors {
            let channel = record.channel_name();
            let resolved = color::resolve(record, &self.own_package, settings);

            // Listed as active regardless of color suppression
            self.active.push(ActiveNotification {
                package: record.package.clone(),
                channel: channel.clone(),
                ticker: record.ticker.clone(),
            });

            let c = match resolved {
                ResolvedColor::Suppressed => continue,
                ResolvedColor::Visible(c) => c,
            };
            tracing::debug!(
                key = %record.key,
                package = %record.package,
                channel = %channel,
                raw = format_args!("#{:08X}", record.lights.unwrap_or(0)),
                accent = format_args!("#{:08X}", record.accent),
                color = format_args!("#{c:08X}"),
                "resolved"
            );
            if !dnd && schedule_active && !colors.contains(&c) {
                colors.push(c);
            }
        }

        colors.sort_unstable();
        let changed = colors != self.current_colors;
        if changed {
            tracing::debug!(count = colors.len(), "color set changed");
            self.current_colors = colors;
            motion.reset_duration();
            self.apply(renderer);
        }

        let reschedule_after_ms =
            (!self.current_colors.is_empty() && timeout_ms > 0).then_some(timeout_ms);

        PassOutcome {
            changed,
            reschedule_after_ms,
            want_motion_sensor: motion::want_motion_sensor(
                self.enabled,
                !self.current_colors.is_empty(),
                settings.seen_on_pickup(pickup_mode),
            ),
        }
    }

    /// Render-or-hide: publish the current set when enabled, otherwise hide
    /// unconditionally.
    pub fn apply(&mut self, renderer: &mut dyn OverlayRenderer) {
        if self.enabled {
            renderer.show(&self.current_colors);
        } else {
            renderer.hide(true);
        }
    }

    /// Update the master switch and immediately re-apply the current set.
    pub fn set_enabled(&mut self, enabled: bool, renderer: &mut dyn OverlayRenderer) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.apply(renderer);
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn mark_all_as_seen(&mut self) {
        self.tracker.mark_all_as_seen();
    }

    /// Forget all tracked state (listener connect/disconnect).
    pub fn clear_tracker(&mut self) {
        self.tracker.clear();
    }

    /// Defensive snapshot of the notifications that survived the last pass.
    pub fn active_notifications(&self) -> Vec<ActiveNotification> {
        self.active.clone()
    }

    /// The last published color set, sorted ascending and de-duplicated.
    pub fn current_colors(&self) -> &[u32] {
        &self.current_colors
    }

    pub fn has_colors(&self) -> bool {
        !self.current_colors.is_empty()
    }
}
