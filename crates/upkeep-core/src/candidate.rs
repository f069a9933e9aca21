//! Update-candidate resolution.
//!
//! Merges the available update sources into at most one active
//! [`ReminderCandidate`]. Resolution is synchronous over already-fetched
//! values; the sources themselves live in [`crate::remote`] and
//! [`crate::feed`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::feed::FeedUpdate;
use crate::remote::RemoteUpdate;

/// Where a candidate came from. Priority when several sources resolve at
/// once: Debug > Secondary > Primary. An explicit mock always wins, and a
/// locally staged feed overrides the remote check so operators can stage
/// rollouts without waiting on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Authoritative remote check.
    Primary,
    /// Locally staged feed file.
    Secondary,
    /// Operator-injected mock.
    Debug,
}

/// The currently active update description eligible for reminding.
/// Transient; recomputed whenever any source changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderCandidate {
    /// Opaque identifier, compared by equality only. No semver ordering
    /// happens in this subsystem.
    pub version: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub source: CandidateSource,
    /// Replaces the default reminder cadence for this candidate only.
    pub interval_override_ms: Option<u64>,
    /// Identity used to decide "is this a new thing to remind about":
    /// `version`, or `version:revision` when the source supplies a
    /// revision, so re-publishing a version with new content counts as a
    /// fresh detection.
    pub detection_key: String,
}

impl ReminderCandidate {
    /// Build an operator-injected mock candidate.
    pub fn mock(version: &str, body: Option<&str>) -> Self {
        Self {
            version: version.to_string(),
            title: None,
            body: body.map(str::to_string),
            source: CandidateSource::Debug,
            interval_override_ms: None,
            detection_key: version.to_string(),
        }
    }

    pub fn from_feed(feed: &FeedUpdate) -> Self {
        Self {
            version: feed.version.clone(),
            title: feed.title.clone(),
            body: feed.body.clone(),
            source: CandidateSource::Secondary,
            interval_override_ms: feed.staleness_ms,
            detection_key: format!("{}:{}", feed.version, feed.revision_ms),
        }
    }

    pub fn from_remote(remote: &RemoteUpdate) -> Self {
        Self {
            version: remote.version.clone(),
            title: None,
            body: remote.body.clone(),
            source: CandidateSource::Primary,
            interval_override_ms: None,
            detection_key: remote.version.clone(),
        }
    }

    /// Single-line changelog snippet: first paragraph of the body,
    /// whitespace collapsed, truncated to 200 chars.
    pub fn snippet(&self) -> Option<String> {
        let body = self.body.as_deref()?;
        let normalized = body.replace("\r\n", "\n");
        let first_paragraph: Vec<&str> = normalized
            .lines()
            .take_while(|line| !line.trim().is_empty())
            .collect();
        let single_line = first_paragraph.join(" ");
        let collapsed = single_line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return None;
        }
        const MAX_LEN: usize = 200;
        if collapsed.chars().count() <= MAX_LEN {
            return Some(collapsed);
        }
        let mut truncated: String = collapsed.chars().take(MAX_LEN - 1).collect();
        truncated.push('…');
        Some(truncated)
    }
}

/// In-memory map from detection key to first-seen instant. Intentionally
/// not persisted: a fresh process re-measures the initial grace period.
#[derive(Debug, Clone, Default)]
pub struct DetectionLedger {
    first_seen: HashMap<String, u64>,
}

impl DetectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a detection key with the current time if unseen.
    pub fn observe(&mut self, detection_key: &str, now_ms: u64) {
        self.first_seen
            .entry(detection_key.to_string())
            .or_insert(now_ms);
    }

    pub fn first_seen(&self, detection_key: &str) -> Option<u64> {
        self.first_seen.get(detection_key).copied()
    }

    /// Forget every detection. A later reappearance is a new detection.
    pub fn clear(&mut self) {
        self.first_seen.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }
}

/// Merge the available source values into one candidate, stamping the
/// ledger on selection and clearing it when nothing is available.
pub fn resolve(
    mock: Option<&ReminderCandidate>,
    feed: Option<&FeedUpdate>,
    remote: Option<&RemoteUpdate>,
    ledger: &mut DetectionLedger,
    now_ms: u64,
) -> Option<ReminderCandidate> {
    let candidate = if let Some(mock) = mock {
        Some(mock.clone())
    } else if let Some(feed) = feed {
        Some(ReminderCandidate::from_feed(feed))
    } else {
        remote.map(ReminderCandidate::from_remote)
    };

    match &candidate {
        Some(c) => ledger.observe(&c.detection_key, now_ms),
        None => ledger.clear(),
    }
    candidate
}
