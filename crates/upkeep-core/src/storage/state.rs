//! Durable per-version suppression and history state.
//!
//! `ReminderState` is the single persisted record of the reminder
//! subsystem. It is mutated exclusively through [`ReminderStore`], which
//! applies each change as a read-modify-write of the whole record and
//! writes it through to the kv store immediately. A failed write is
//! logged and the in-memory copy stays authoritative until the next
//! successful persist.
//!
//! A corrupt or partially-shaped stored payload silently resets to
//! defaults on load; losing suppression history is a far better failure
//! mode than refusing to start.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::Database;
use crate::candidate::ReminderCandidate;
use crate::error::StorageError;

const STATE_KEY: &str = "reminder_state";
const MOCK_KEY: &str = "mock_candidate";

/// Presentation style for the in-app reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStyle {
    /// Persistent card; stays until the user acts.
    #[default]
    Card,
    /// Transient toast; auto-dismisses after a timeout.
    Toast,
}

/// Persisted reminder state. Survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderState {
    /// Versions the user skipped. Terminal per version.
    #[serde(default)]
    pub dismissed_versions: BTreeSet<String>,
    /// Version -> epoch ms until which the version is hidden.
    #[serde(default)]
    pub snoozed_until: BTreeMap<String, u64>,
    /// Version -> epoch ms of the last in-app presentation.
    #[serde(default)]
    pub last_shown_at: BTreeMap<String, u64>,
    /// Version -> epoch ms of the last background notification.
    /// Tracked separately: the two channels are rate-limited independently.
    #[serde(default)]
    pub last_notification_at: BTreeMap<String, u64>,
    #[serde(default)]
    pub preferred_style: ReminderStyle,
    /// Hide the reminder while a fullscreen app is in front.
    #[serde(default)]
    pub pause_while_fullscreen: bool,
    /// Epoch ms until which all reminding is manually paused (0 = not paused).
    #[serde(default)]
    pub manual_pause_until: u64,
}

impl ReminderState {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_dismissed(&self, version: &str) -> bool {
        self.dismissed_versions.contains(version)
    }

    pub fn snoozed_until(&self, version: &str) -> Option<u64> {
        self.snoozed_until.get(version).copied()
    }

    pub fn last_shown_at(&self, version: &str) -> Option<u64> {
        self.last_shown_at.get(version).copied()
    }

    pub fn last_notification_at(&self, version: &str) -> Option<u64> {
        self.last_notification_at.get(version).copied()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Dismiss a version permanently. Dismiss is strictly stronger than
    /// snooze, so any snooze entry for the version is removed.
    pub fn dismiss(&mut self, version: &str) {
        self.dismissed_versions.insert(version.to_string());
        self.snoozed_until.remove(version);
    }

    /// Hide a version until `until_ms`. Re-snoozing un-dismisses; only an
    /// explicit skip is terminal.
    pub fn snooze(&mut self, version: &str, until_ms: u64) {
        self.snoozed_until.insert(version.to_string(), until_ms);
        self.dismissed_versions.remove(version);
    }

    /// Record an in-app presentation. Consumes any snooze entry for the
    /// version so an expired snooze cannot re-trigger eligibility.
    pub fn mark_shown(&mut self, version: &str, now_ms: u64) {
        self.last_shown_at.insert(version.to_string(), now_ms);
        self.snoozed_until.remove(version);
    }

    /// Record a delivered background notification.
    pub fn mark_notified(&mut self, version: &str, now_ms: u64) {
        self.last_notification_at.insert(version.to_string(), now_ms);
    }
}

/// Owns the persisted [`ReminderState`] plus its backing database.
pub struct ReminderStore {
    db: Database,
    state: ReminderState,
}

impl ReminderStore {
    /// Open the store at the default data directory.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened. A missing or
    /// unparseable state payload is not an error; it loads as defaults.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        Ok(Self::with_database(Database::open()?))
    }

    /// Wrap an already-open database.
    pub fn with_database(db: Database) -> Self {
        let state = Self::load_state(&db);
        Self { db, state }
    }

    fn load_state(db: &Database) -> ReminderState {
        match db.kv_get(STATE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, "stored reminder state is malformed, resetting to defaults");
                    ReminderState::default()
                }
            },
            Ok(None) => ReminderState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored reminder state, using defaults");
                ReminderState::default()
            }
        }
    }

    pub fn state(&self) -> &ReminderState {
        &self.state
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize reminder state");
                return;
            }
        };
        if let Err(e) = self.db.kv_set(STATE_KEY, &json) {
            // In-memory state stays authoritative until the next write.
            tracing::warn!(error = %e, "failed to persist reminder state");
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    pub fn dismiss(&mut self, version: &str) {
        self.state.dismiss(version);
        self.persist();
    }

    pub fn snooze(&mut self, version: &str, until_ms: u64) {
        self.state.snooze(version, until_ms);
        self.persist();
    }

    pub fn mark_shown(&mut self, version: &str, now_ms: u64) {
        self.state.mark_shown(version, now_ms);
        self.persist();
    }

    pub fn mark_notified(&mut self, version: &str, now_ms: u64) {
        self.state.mark_notified(version, now_ms);
        self.persist();
    }

    pub fn set_style(&mut self, style: ReminderStyle) {
        self.state.preferred_style = style;
        self.persist();
    }

    pub fn set_pause_while_fullscreen(&mut self, enabled: bool) {
        self.state.pause_while_fullscreen = enabled;
        self.persist();
    }

    /// Pause all reminding until `until_ms` (0 resumes).
    pub fn set_manual_pause_until(&mut self, until_ms: u64) {
        self.state.manual_pause_until = until_ms;
        self.persist();
    }

    /// Restore defaults, discarding all suppression history.
    pub fn reset(&mut self) {
        self.state = ReminderState::default();
        self.persist();
    }

    // ── Operator mock candidate ──────────────────────────────────────

    /// Store an operator-injected mock candidate.
    pub fn set_mock(&self, candidate: &ReminderCandidate) -> Result<(), StorageError> {
        let json = serde_json::to_string(candidate)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        self.db.kv_set(MOCK_KEY, &json)
    }

    /// Remove the stored mock candidate.
    pub fn clear_mock(&self) -> Result<(), StorageError> {
        self.db.kv_delete(MOCK_KEY)
    }

    /// Read the stored mock candidate, if any. Malformed payloads read
    /// as absent.
    pub fn mock(&self) -> Option<ReminderCandidate> {
        let json = self.db.kv_get(MOCK_KEY).ok().flatten()?;
        serde_json::from_str(&json).ok()
    }
}
