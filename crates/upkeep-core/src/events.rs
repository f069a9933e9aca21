use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateSource;
use crate::storage::ReminderStyle;

/// Every externally visible transition produces an Event. The host GUI
/// subscribes to render the banner; the CLI `watch` command prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A new update candidate became active.
    CandidateDetected {
        version: String,
        source: CandidateSource,
        at: DateTime<Utc>,
    },
    /// All sources went quiet; the detection ledger was cleared.
    CandidateCleared {
        at: DateTime<Utc>,
    },
    ReminderShown {
        version: String,
        style: ReminderStyle,
        title: Option<String>,
        snippet: Option<String>,
        at: DateTime<Utc>,
    },
    ReminderHidden {
        version: String,
        at: DateTime<Utc>,
    },
    ReminderSnoozed {
        version: String,
        until_ms: u64,
        at: DateTime<Utc>,
    },
    VersionDismissed {
        version: String,
        at: DateTime<Utc>,
    },
    /// User asked for the full update view.
    DetailsRequested {
        version: String,
        at: DateTime<Utc>,
    },
    NotificationSent {
        version: String,
        at: DateTime<Utc>,
    },
    StateReset {
        at: DateTime<Utc>,
    },
}
