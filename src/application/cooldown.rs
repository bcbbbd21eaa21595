//! Per-user, per-unit cooldown ledger

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;

use crate::domain::entities::{Gated, UnitKind};

/// Key of a cooldown entry. The unit kind keeps a message command and a
/// slash command with the same name apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub user_id: String,
    pub kind: UnitKind,
    pub name: String,
}

impl CooldownKey {
    pub fn new(user_id: &str, unit: &dyn Gated) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: unit.kind(),
            name: unit.cooldown_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownEntry {
    pub ends_at: DateTime<Utc>,
    /// Whether the "still cooling down" notice was already sent
    pub message_shown: bool,
}

impl CooldownEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.ends_at
    }

    /// Whole seconds left, rounded up
    pub fn seconds_left(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.ends_at - now).num_milliseconds();
        (millis as f64 / 1000.0).ceil() as i64
    }
}

/// Partial update applied by `CooldownStore::edit`
#[derive(Debug, Clone, Copy, Default)]
pub struct CooldownPatch {
    pub ends_at: Option<DateTime<Utc>>,
    pub message_shown: Option<bool>,
}

impl CooldownPatch {
    pub fn message_shown() -> Self {
        Self {
            message_shown: Some(true),
            ..Self::default()
        }
    }
}

/// In-memory cooldown store. Entries live until replaced or swept.
#[derive(Debug, Default)]
pub struct CooldownStore {
    entries: Mutex<HashMap<CooldownKey, CooldownEntry>>,
}

impl CooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CooldownKey, CooldownEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, user_id: &str, unit: &dyn Gated) -> Option<CooldownEntry> {
        self.lock().get(&CooldownKey::new(user_id, unit)).copied()
    }

    /// Returns the current entry and whether the user may run the unit now.
    pub fn check(&self, user_id: &str, unit: &dyn Gated) -> (Option<CooldownEntry>, bool) {
        let entry = self.get(user_id, unit);

        let allowed = !unit.has_cooldown()
            || entry.map_or(true, |e| e.is_expired(Utc::now()));

        (entry, allowed)
    }

    /// Start (or restart) the cooldown. No-op for units without a cooldown.
    pub fn add(&self, user_id: &str, unit: &dyn Gated, override_secs: Option<f64>) {
        if !unit.has_cooldown() {
            return;
        }

        let secs = override_secs.or(unit.cooldown()).unwrap_or(0.0);
        let entry = CooldownEntry {
            ends_at: ends_after(Utc::now(), secs),
            message_shown: false,
        };
        self.lock().insert(CooldownKey::new(user_id, unit), entry);
    }

    /// Merge `patch` into the entry, creating a default one first if absent.
    pub fn edit(&self, user_id: &str, unit: &dyn Gated, patch: CooldownPatch) {
        let key = CooldownKey::new(user_id, unit);
        let mut entries = self.lock();
        let entry = entries.entry(key).or_insert_with(|| CooldownEntry {
            ends_at: ends_after(Utc::now(), unit.cooldown().unwrap_or(0.0)),
            message_shown: false,
        });

        if let Some(ends_at) = patch.ends_at {
            entry.ends_at = ends_at;
        }
        if let Some(shown) = patch.message_shown {
            entry.message_shown = shown;
        }
    }

    /// Evict expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Run `sweep` periodically until the returned task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = store.sweep();
                if evicted > 0 {
                    tracing::debug!("Swept {} expired cooldown entries", evicted);
                }
            }
        })
    }
}

/// `now + secs`, saturating at the latest representable instant
fn ends_after(now: DateTime<Utc>, secs: f64) -> DateTime<Utc> {
    // float to int casts saturate
    TimeDelta::try_milliseconds((secs * 1000.0).round() as i64)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unit {
        kind: UnitKind,
        name: &'static str,
        cooldown: Option<f64>,
    }

    impl Gated for Unit {
        fn kind(&self) -> UnitKind {
            self.kind
        }

        fn cooldown_name(&self) -> String {
            self.name.to_string()
        }

        fn cooldown(&self) -> Option<f64> {
            self.cooldown
        }

        fn developer_only(&self) -> bool {
            false
        }

        fn maintenance(&self) -> bool {
            false
        }
    }

    fn command(cooldown: Option<f64>) -> Unit {
        Unit {
            kind: UnitKind::Command,
            name: "ping",
            cooldown,
        }
    }

    #[test]
    fn test_no_cooldown_is_always_allowed() {
        let store = CooldownStore::new();
        let unit = command(None);

        store.add("U1", &unit, None);
        assert!(store.is_empty());
        assert_eq!(store.check("U1", &unit), (None, true));
    }

    #[tokio::test]
    async fn test_cooldown_expires() {
        let store = CooldownStore::new();
        let unit = command(Some(0.2));

        assert!(store.check("U1", &unit).1);
        store.add("U1", &unit, None);

        let (entry, allowed) = store.check("U1", &unit);
        assert!(!allowed);
        assert!(!entry.unwrap().message_shown);
        // other users are unaffected
        assert!(store.check("U2", &unit).1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.check("U1", &unit).1);
    }

    #[test]
    fn test_huge_cooldown_saturates() {
        let store = CooldownStore::new();
        let unit = command(Some(1e13));

        store.add("U1", &unit, None);
        let (entry, allowed) = store.check("U1", &unit);
        assert!(!allowed);
        assert_eq!(entry.unwrap().ends_at, DateTime::<Utc>::MAX_UTC);

        let other = command(Some(f64::MAX));
        store.edit("U2", &other, CooldownPatch::message_shown());
        assert!(!store.check("U2", &other).1);
    }

    #[test]
    fn test_add_replaces_entry() {
        let store = CooldownStore::new();
        let unit = command(Some(10.0));

        store.add("U1", &unit, None);
        store.edit("U1", &unit, CooldownPatch::message_shown());
        assert!(store.get("U1", &unit).unwrap().message_shown);

        store.add("U1", &unit, Some(5.0));
        let entry = store.get("U1", &unit).unwrap();
        assert!(!entry.message_shown);
        assert!(entry.seconds_left(Utc::now()) <= 5);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_edit_creates_default_entry() {
        let store = CooldownStore::new();
        let unit = command(Some(10.0));

        store.edit("U1", &unit, CooldownPatch::message_shown());
        let entry = store.get("U1", &unit).unwrap();
        assert!(entry.message_shown);
        assert_eq!(entry.seconds_left(Utc::now()), 10);
    }

    #[test]
    fn test_kinds_do_not_share_entries() {
        let store = CooldownStore::new();
        let message = command(Some(10.0));
        let slash = Unit {
            kind: UnitKind::SlashCommand,
            name: "ping",
            cooldown: Some(10.0),
        };

        store.add("U1", &message, None);
        assert!(!store.check("U1", &message).1);
        assert!(store.check("U1", &slash).1);
    }

    #[test]
    fn test_sweep_removes_expired() {
        let store = CooldownStore::new();
        let unit = command(Some(10.0));
        let other = Unit {
            kind: UnitKind::Command,
            name: "pong",
            cooldown: Some(10.0),
        };

        store.add("U1", &unit, None);
        store.add("U1", &other, None);
        store.edit(
            "U1",
            &other,
            CooldownPatch {
                ends_at: Some(Utc::now() - chrono::Duration::seconds(1)),
                ..CooldownPatch::default()
            },
        );

        assert_eq!(store.sweep(), 1);
        assert!(store.get("U1", &unit).is_some());
        assert!(store.get("U1", &other).is_none());
    }
}
