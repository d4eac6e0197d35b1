//! Notification records as reported by the host notification source.

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Channel name used when a notification carries no channel id.
pub const LEGACY_CHANNEL: &str = "legacy";

/// One live notification, read-only input to a reconciliation pass.
///
/// `lights` is the channel's raw light color and is only present when the
/// channel exists and has lights enabled; `Some(0)` is a real (and common)
/// value, meaning the producer asked for "default" by passing black.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Host-unique key for this notification.
    pub key: String,
    /// Owning package identifier.
    pub package: String,
    /// Channel identifier; `None` for pre-channel notifications.
    pub channel_id: Option<String>,
    /// Raw channel light color, when lights are enabled.
    pub lights: Option<u32>,
    /// Dominant accent color of the notification (0 when absent).
    pub accent: u32,
    /// Ticker/title text, if any.
    pub ticker: Option<String>,
    /// Post timestamp in epoch milliseconds.
    pub posted_at_ms: i64,
}

impl NotificationRecord {
    /// Sanitized channel name, falling back to the legacy sentinel.
    pub fn channel_name(&self) -> String {
        match &self.channel_id {
            Some(id) => sanitize_channel_id(id),
            None => LEGACY_CHANNEL.to_string(),
        }
    }

    /// Content fingerprint. An edit that changes any color-relevant content
    /// makes the notification count as new again.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.ticker.hash(&mut hasher);
        self.lights.hash(&mut hasher);
        self.accent.hash(&mut hasher);
        hasher.finish()
    }
}

/// Normalize a channel identifier to `[A-Za-z0-9_:.-]`, replacing everything
/// else with `_`.
pub fn sanitize_channel_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read-only snapshot of a notification that survived the last pass,
/// exposed to external observers. Rebuilt from scratch every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveNotification {
    pub package: String,
    pub channel: String,
    pub ticker: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> NotificationRecord {
        NotificationRecord {
            key: key.to_string(),
            package: "com.example.app".to_string(),
            channel_id: Some("inbox".to_string()),
            lights: Some(0xFF00FF00),
            accent: 0,
            ticker: Some("hello".to_string()),
            posted_at_ms: 1_000,
        }
    }

    #[test]
    fn sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_channel_id("mail_inbox:1.0-x"), "mail_inbox:1.0-x");
        assert_eq!(sanitize_channel_id("weird channel!"), "weird_channel_");
        assert_eq!(sanitize_channel_id("émoji🙂"), "_moji_");
    }

    #[test]
    fn missing_channel_falls_back_to_legacy() {
        let mut r = record("a");
        r.channel_id = None;
        assert_eq!(r.channel_name(), LEGACY_CHANNEL);
    }

    #[test]
    fn fingerprint_changes_on_edit() {
        let a = record("a");
        let mut edited = a.clone();
        edited.ticker = Some("updated".to_string());
        assert_ne!(a.fingerprint(), edited.fingerprint());

        // The key itself is not part of the fingerprint
        let mut rekeyed = a.clone();
        rekeyed.key = "b".to_string();
        assert_eq!(a.fingerprint(), rekeyed.fingerprint());
    }
}
