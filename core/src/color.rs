//! Per-notification color resolution.
//!
//! Maps one notification record plus the stored overrides into a single
//! ARGB color, applying the channel/brand correction rules accumulated from
//! real-world producers (black-means-default, white-plus-accent, forced
//! alpha), then arbitrates against the override store.

use crate::record::NotificationRecord;
use crate::settings::SettingsStore;

pub const OPAQUE_BLACK: u32 = 0xFF00_0000;
const RGB_MASK: u32 = 0x00FF_FFFF;

/// Outcome of resolving one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedColor {
    Visible(u32),
    /// Final RGB is exactly zero: the user muted this channel by picking
    /// black, or the channel never requested lights. Callers must exclude
    /// the notification from the color set rather than render pure black.
    Suppressed,
}

/// Resolve the alert color for `record`.
///
/// `own_package` is this application's own package identifier; accent
/// substitution never applies to our own notifications. The override store
/// is read and, when no user choice is pinned, updated with the freshly
/// derived value so later runs prefer it over re-deriving.
pub fn resolve(
    record: &NotificationRecord,
    own_package: &str,
    settings: &mut dyn SettingsStore,
) -> ResolvedColor {
    let channel = record.channel_name();
    let mut c = OPAQUE_BLACK;

    if let Some(light) = record.lights {
        c = light;

        // Some producers pass black meaning "default light": use white
        if c & RGB_MASK == 0 {
            c = RGB_MASK;
        }

        // White lights are everywhere; prefer a saturated variant of the
        // notification accent when one exists (but never for our own
        // notifications, those are deliberate)
        if (c & RGB_MASK) == RGB_MASK
            && (record.accent & RGB_MASK) > 0
            && record.package != own_package
        {
            c = maximize_dominant(record.accent);
        }

        c |= OPAQUE_BLACK;
    }

    match settings.channel_color(&record.package, &channel) {
        Some(stored) if stored.user_set => c = stored.color,
        _ => settings.save_default_color(&record.package, &channel, c),
    }

    // Alpha again: stored values may predate the alpha rule
    c |= OPAQUE_BLACK;

    if c & RGB_MASK == 0 {
        ResolvedColor::Suppressed
    } else {
        ResolvedColor::Visible(c)
    }
}

/// Force the largest RGB channel of `color` to full brightness, keeping the
/// others. Ties break red, then green, then blue.
fn maximize_dominant(color: u32) -> u32 {
    let mut r = (color >> 16) & 0xFF;
    let mut g = (color >> 8) & 0xFF;
    let mut b = color & 0xFF;

    if r >= g && r >= b {
        r = 255;
    } else if g >= r && g >= b {
        g = 255;
    } else {
        b = 255;
    }

    (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    const OWN_PACKAGE: &str = "app.halo";

    fn record(lights: Option<u32>, accent: u32) -> NotificationRecord {
        NotificationRecord {
            key: "0|com.example|1".to_string(),
            package: "com.example.app".to_string(),
            channel_id: Some("inbox".to_string()),
            lights,
            accent,
            ticker: None,
            posted_at_ms: 0,
        }
    }

    fn visible(r: ResolvedColor) -> u32 {
        match r {
            ResolvedColor::Visible(c) => c,
            ResolvedColor::Suppressed => panic!("expected visible color"),
        }
    }

    #[test]
    fn plain_light_color_gets_alpha() {
        let mut settings = MemorySettings::default();
        let c = visible(resolve(&record(Some(0x0000FF00), 0), OWN_PACKAGE, &mut settings));
        assert_eq!(c, 0xFF00FF00);
    }

    #[test]
    fn black_light_becomes_white() {
        let mut settings = MemorySettings::default();
        let c = visible(resolve(&record(Some(0x00000000), 0), OWN_PACKAGE, &mut settings));
        assert_eq!(c, 0xFFFFFFFF);
    }

    #[test]
    fn white_light_with_accent_maximizes_dominant_channel() {
        let mut settings = MemorySettings::default();
        // Blue-dominant accent: blue forced to 255, red/green retained
        let c = visible(resolve(
            &record(Some(0xFFFFFFFF), 0xFF10A0FF),
            OWN_PACKAGE,
            &mut settings,
        ));
        assert_eq!(c, 0xFF10A0FF | OPAQUE_BLACK);
        assert_eq!(c & 0xFF, 0xFF);
        assert_eq!((c >> 16) & 0xFF, 0x10);
        assert_eq!((c >> 8) & 0xFF, 0xA0);
    }

    #[test]
    fn accent_substitution_applies_after_black_to_white() {
        let mut settings = MemorySettings::default();
        // Black light first becomes white, which then qualifies for the
        // accent path
        let c = visible(resolve(
            &record(Some(0x00000000), 0x00800010),
            OWN_PACKAGE,
            &mut settings,
        ));
        assert_eq!(c, 0xFFFF0010);
    }

    #[test]
    fn own_package_keeps_white() {
        let mut settings = MemorySettings::default();
        let mut r = record(Some(0xFFFFFFFF), 0xFF10A0FF);
        r.package = OWN_PACKAGE.to_string();
        let c = visible(resolve(&r, OWN_PACKAGE, &mut settings));
        assert_eq!(c, 0xFFFFFFFF);
    }

    #[test]
    fn tie_breaks_red_then_green_then_blue() {
        assert_eq!(maximize_dominant(0x00505050), 0x00FF5050);
        assert_eq!(maximize_dominant(0x00105050), 0x0010FF50);
        assert_eq!(maximize_dominant(0x00105060), 0x001050FF);
    }

    #[test]
    fn no_lights_is_suppressed_and_persists_black_default() {
        let mut settings = MemorySettings::default();
        let r = record(None, 0xFF123456);
        assert_eq!(resolve(&r, OWN_PACKAGE, &mut settings), ResolvedColor::Suppressed);
        let stored = settings.channel_color("com.example.app", "inbox").unwrap();
        assert_eq!(stored.color, OPAQUE_BLACK);
        assert!(!stored.user_set);
    }

    #[test]
    fn user_black_override_suppresses_nonblack_derivation() {
        let mut settings = MemorySettings::default();
        settings.set_user_color("com.example.app", "inbox", OPAQUE_BLACK);
        let r = record(Some(0xFF00FF00), 0);
        assert_eq!(resolve(&r, OWN_PACKAGE, &mut settings), ResolvedColor::Suppressed);
    }

    #[test]
    fn user_override_supersedes_derivation() {
        let mut settings = MemorySettings::default();
        settings.set_user_color("com.example.app", "inbox", 0x00123456);
        let c = visible(resolve(&record(Some(0xFF00FF00), 0), OWN_PACKAGE, &mut settings));
        // Stored value wins, with alpha re-applied
        assert_eq!(c, 0xFF123456);
        // And the pinned override is not clobbered by the derivation
        let stored = settings.channel_color("com.example.app", "inbox").unwrap();
        assert_eq!(stored.color, 0x00123456);
        assert!(stored.user_set);
    }

    #[test]
    fn derived_default_self_heals_every_pass() {
        let mut settings = MemorySettings::default();
        visible(resolve(&record(Some(0xFF00FF00), 0), OWN_PACKAGE, &mut settings));
        assert_eq!(
            settings.channel_color("com.example.app", "inbox").unwrap().color,
            0xFF00FF00
        );

        // Channel color changed upstream: the stored default follows it
        visible(resolve(&record(Some(0xFF0000FF), 0), OWN_PACKAGE, &mut settings));
        let stored = settings.channel_color("com.example.app", "inbox").unwrap();
        assert_eq!(stored.color, 0xFF0000FF);
        assert!(!stored.user_set);
    }
}
