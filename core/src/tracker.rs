//! Notification seen/unseen lifecycle tracking.
//!
//! The tracker is the authoritative record of which notifications are
//! currently relevant across reconciliation passes. It never fails:
//! malformed input (duplicate keys) is coalesced last-write-wins.

use std::collections::HashMap;

use crate::record::NotificationRecord;

/// Per-notification bookkeeping. Exists iff the notification was observed in
/// a recent pass; removal happens when the host stops reporting the key.
#[derive(Debug, Clone)]
struct TrackedEntry {
    first_seen_ms: i64,
    seen: bool,
    fingerprint: u64,
}

/// Tracks the seen/unseen lifecycle of live notifications across passes.
#[derive(Debug, Default)]
pub struct NotificationTracker {
    entries: HashMap<String, TrackedEntry>,
}

impl NotificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the tracker against the host's current live set and return
    /// the records that should still contribute colors.
    ///
    /// - Unknown keys get a fresh unseen entry.
    /// - A changed content fingerprint resets the entry: an edit counts as
    ///   a new, unseen occurrence.
    /// - `force_mark_seen` marks every entry touched this pass as seen
    ///   (screen-on policy).
    /// - Entries whose key is gone from `live` are dropped.
    /// - With `timeout_ms > 0`, entries that are seen and older than the
    ///   timeout are excluded from the result but stay tracked, so they
    ///   cannot re-trigger as new on the next pass.
    ///
    /// Duplicate keys in `live` coalesce last-write-wins. Result ordering
    /// carries no meaning; callers treat it as a set.
    pub fn prune(
        &mut self,
        live: Vec<NotificationRecord>,
        force_mark_seen: bool,
        timeout_ms: i64,
        now_ms: i64,
    ) -> Vec<NotificationRecord> {
        let mut coalesced: HashMap<String, NotificationRecord> = HashMap::new();
        for record in live {
            coalesced.insert(record.key.clone(), record);
        }

        for (key, record) in &coalesced {
            let fingerprint = record.fingerprint();
            let entry = self
                .entries
                .entry(key.clone())
                .and_modify(|e| {
                    if e.fingerprint != fingerprint {
                        // Content changed: treat as a fresh occurrence
                        e.first_seen_ms = now_ms;
                        e.seen = false;
                        e.fingerprint = fingerprint;
                    }
                })
                .or_insert(TrackedEntry {
                    first_seen_ms: now_ms,
                    seen: false,
                    fingerprint,
                });
            if force_mark_seen {
                entry.seen = true;
            }
        }

        // Dismissed/removed notifications drop out of tracking entirely
        self.entries.retain(|key, _| coalesced.contains_key(key));

        coalesced
            .into_values()
            .filter(|record| {
                let Some(entry) = self.entries.get(&record.key) else {
                    return false;
                };
                !Self::expired(entry, timeout_ms, now_ms)
            })
            .collect()
    }

    fn expired(entry: &TrackedEntry, timeout_ms: i64, now_ms: i64) -> bool {
        timeout_ms > 0 && entry.seen && now_ms - entry.first_seen_ms >= timeout_ms
    }

    /// Mark every tracked notification as seen. Does not change the live set.
    pub fn mark_all_as_seen(&mut self) {
        for entry in self.entries.values_mut() {
            entry.seen = true;
        }
    }

    /// Drop all tracked state (listener connect/disconnect).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, ticker: &str) -> NotificationRecord {
        NotificationRecord {
            key: key.to_string(),
            package: "com.example.app".to_string(),
            channel_id: Some("inbox".to_string()),
            lights: Some(0xFF0000FF),
            accent: 0,
            ticker: Some(ticker.to_string()),
            posted_at_ms: 0,
        }
    }

    fn keys(records: &[NotificationRecord]) -> Vec<&str> {
        let mut keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn new_records_are_tracked_and_returned() {
        let mut tracker = NotificationTracker::new();
        let out = tracker.prune(vec![record("a", "x"), record("b", "y")], false, 0, 1_000);
        assert_eq!(keys(&out), ["a", "b"]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn removed_records_drop_out() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x"), record("b", "y")], false, 0, 1_000);
        let out = tracker.prune(vec![record("b", "y")], false, 0, 2_000);
        assert_eq!(keys(&out), ["b"]);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn seen_entry_expires_after_timeout_but_stays_tracked() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x")], true, 5_000, 1_000);

        // Strictly within the timeout: still contributing
        let out = tracker.prune(vec![record("a", "x")], false, 5_000, 5_999);
        assert_eq!(out.len(), 1);

        // At exactly first_seen + timeout: excluded, but still tracked
        let out = tracker.prune(vec![record("a", "x")], false, 5_000, 6_000);
        assert!(out.is_empty());
        assert_eq!(tracker.len(), 1);

        // And it does not come back as a new unseen entry later
        let out = tracker.prune(vec![record("a", "x")], false, 5_000, 60_000);
        assert!(out.is_empty());
    }

    #[test]
    fn unseen_entry_never_expires() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x")], false, 5_000, 1_000);
        let out = tracker.prune(vec![record("a", "x")], false, 5_000, 1_000_000);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn zero_timeout_disables_expiry() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x")], true, 0, 1_000);
        let out = tracker.prune(vec![record("a", "x")], false, 0, i64::MAX - 1);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn edit_resets_seen_state() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x")], true, 5_000, 1_000);

        // Expired out of the color set
        assert!(tracker.prune(vec![record("a", "x")], false, 5_000, 10_000).is_empty());

        // Content change: counts as new and unseen again
        let out = tracker.prune(vec![record("a", "edited")], false, 5_000, 11_000);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn mark_all_as_seen_applies_to_every_entry() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x"), record("b", "y")], false, 5_000, 1_000);
        tracker.mark_all_as_seen();
        let out = tracker.prune(
            vec![record("a", "x"), record("b", "y")],
            false,
            5_000,
            10_000,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn duplicate_keys_coalesce_last_write_wins() {
        let mut tracker = NotificationTracker::new();
        let out = tracker.prune(
            vec![record("a", "first"), record("a", "second")],
            false,
            0,
            1_000,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ticker.as_deref(), Some("second"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn clear_empties_tracking() {
        let mut tracker = NotificationTracker::new();
        tracker.prune(vec![record("a", "x")], true, 5_000, 1_000);
        tracker.clear();
        assert!(tracker.is_empty());

        // Previously-expired notification is fresh again after a clear
        let out = tracker.prune(vec![record("a", "x")], false, 5_000, 100_000);
        assert_eq!(out.len(), 1);
    }
}
