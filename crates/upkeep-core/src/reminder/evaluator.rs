//! Reminder decision function.
//!
//! `evaluate` is pure: same inputs, same output, no side effects. The
//! caller (the controller) applies the returned intent — marking the
//! version shown, delivering the background notification, re-arming the
//! timer. Suppressors are an ordered rule list evaluated top to bottom;
//! the first matching rule wins, which keeps precedence auditable and
//! each rule testable in isolation.
//!
//! Rescheduling is always "exact remaining time until the decision can
//! change", never fixed-interval polling: the reminder appears within
//! one scheduling quantum of becoming eligible, and the latency bound is
//! analyzable.

use serde::{Deserialize, Serialize};

use crate::candidate::{DetectionLedger, ReminderCandidate};
use crate::signals::Signals;
use crate::storage::ReminderState;

/// Timing knobs for the decision function. All fields are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTiming {
    /// Grace period between first detection and the first reminder.
    #[serde(default = "default_first_delay_ms")]
    pub first_delay_ms: u64,
    /// Minimum spacing between consecutive presentations of one version.
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
    /// Floor applied by the scheduler to every requested delay.
    #[serde(default = "default_min_reschedule_ms")]
    pub min_reschedule_ms: u64,
    /// Re-check interval while the window is inactive.
    #[serde(default = "default_inactive_poll_ms")]
    pub inactive_poll_ms: u64,
    /// Floor for the fullscreen re-check interval. Polling fullscreen
    /// state is comparatively expensive, so this floor is larger than
    /// the normal reschedule quantum.
    #[serde(default = "default_fullscreen_poll_floor_ms")]
    pub fullscreen_poll_floor_ms: u64,
    /// Minimum spacing between background notifications for one version.
    #[serde(default = "default_notify_rate_limit_ms")]
    pub notify_rate_limit_ms: u64,
}

fn default_first_delay_ms() -> u64 {
    10 * 60 * 1000
}
fn default_cadence_ms() -> u64 {
    24 * 60 * 60 * 1000
}
fn default_min_reschedule_ms() -> u64 {
    5 * 1000
}
fn default_inactive_poll_ms() -> u64 {
    30 * 1000
}
fn default_fullscreen_poll_floor_ms() -> u64 {
    30 * 1000
}
fn default_notify_rate_limit_ms() -> u64 {
    24 * 60 * 60 * 1000
}

impl Default for ReminderTiming {
    fn default() -> Self {
        Self {
            first_delay_ms: default_first_delay_ms(),
            cadence_ms: default_cadence_ms(),
            min_reschedule_ms: default_min_reschedule_ms(),
            inactive_poll_ms: default_inactive_poll_ms(),
            fullscreen_poll_floor_ms: default_fullscreen_poll_floor_ms(),
            notify_rate_limit_ms: default_notify_rate_limit_ms(),
        }
    }
}

/// Request to fire the background side channel for a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyIntent {
    pub version: String,
    pub title: String,
    pub body: String,
}

impl NotifyIntent {
    fn for_candidate(candidate: &ReminderCandidate) -> Self {
        let title = candidate
            .title
            .clone()
            .unwrap_or_else(|| format!("Update {} available", candidate.version));
        let body = candidate
            .snippet()
            .unwrap_or_else(|| "A new version is ready to install.".to_string());
        Self {
            version: candidate.version.clone(),
            title,
            body,
        }
    }
}

/// Output of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Show the in-app reminder now. The caller must immediately record
    /// mark-shown and present UI.
    pub visible: bool,
    /// Fire the background side channel (window inactive, rate limit
    /// passed). The caller records mark-notified only on delivery.
    pub notify: Option<NotifyIntent>,
    /// When to re-evaluate, in ms. `None` means no wake-up is needed:
    /// only an external event can change the decision.
    pub reschedule: Option<u64>,
}

impl Evaluation {
    fn hidden(reschedule: Option<u64>) -> Self {
        Self {
            visible: false,
            notify: None,
            reschedule,
        }
    }
}

enum Eligibility {
    Ready,
    Wait(u64),
}

/// Cadence eligibility for a candidate the suppressors let through.
///
/// An expired snooze entry means the user explicitly asked to be
/// re-reminded after the snooze, so the version is treated as newly
/// detected at its original first-seen time: the never-shown branch
/// applies, and at snooze expiry `now - first_seen` always exceeds the
/// first-reminder delay. The entry is consumed by mark-shown.
fn eligibility(
    candidate: &ReminderCandidate,
    state: &ReminderState,
    first_seen_ms: u64,
    timing: &ReminderTiming,
    now_ms: u64,
) -> Eligibility {
    let snooze_expired = state
        .snoozed_until(&candidate.version)
        .is_some_and(|until| now_ms >= until);

    let last_shown = if snooze_expired {
        None
    } else {
        state.last_shown_at(&candidate.version)
    };

    match last_shown {
        None => {
            let since_detected = now_ms.saturating_sub(first_seen_ms);
            if since_detected >= timing.first_delay_ms {
                Eligibility::Ready
            } else {
                Eligibility::Wait(timing.first_delay_ms - since_detected)
            }
        }
        Some(shown_at) => {
            let effective_cadence = candidate
                .interval_override_ms
                .unwrap_or(timing.cadence_ms);
            let since_shown = now_ms.saturating_sub(shown_at);
            if since_shown >= effective_cadence {
                Eligibility::Ready
            } else {
                Eligibility::Wait(effective_cadence - since_shown)
            }
        }
    }
}

/// Decide what the reminder should do right now.
pub fn evaluate(
    candidate: Option<&ReminderCandidate>,
    state: &ReminderState,
    ledger: &DetectionLedger,
    signals: Signals,
    timing: &ReminderTiming,
    now_ms: u64,
) -> Evaluation {
    // Rule 1: nothing to remind about.
    let Some(candidate) = candidate else {
        return Evaluation::hidden(None);
    };

    // Rule 2: dismissed is terminal per version.
    if state.is_dismissed(&candidate.version) {
        return Evaluation::hidden(None);
    }

    // Rule 3: manual pause.
    if state.manual_pause_until > now_ms {
        return Evaluation::hidden(Some(state.manual_pause_until - now_ms));
    }

    // Rule 4: fullscreen guard.
    if state.pause_while_fullscreen && signals.fullscreen_busy {
        let poll = (timing.cadence_ms / 6).max(timing.fullscreen_poll_floor_ms);
        return Evaluation::hidden(Some(poll));
    }

    // Rule 5: an install is already underway.
    if signals.update_in_progress {
        return Evaluation::hidden(Some(timing.cadence_ms));
    }

    // Rule 6: active snooze. Wake exactly at expiry.
    if let Some(until) = state.snoozed_until(&candidate.version) {
        if until > now_ms {
            return Evaluation::hidden(Some(until - now_ms));
        }
    }

    // Rule 7: the resolver always stamps the ledger before the
    // evaluator runs, but if the entry is missing, wait out a fresh
    // grace period rather than showing immediately.
    let Some(first_seen) = ledger.first_seen(&candidate.detection_key) else {
        return Evaluation::hidden(Some(timing.first_delay_ms));
    };

    let eligible = eligibility(candidate, state, first_seen, timing, now_ms);

    // Rule 8: window inactive. The banner cannot be seen; fire the side
    // channel instead, but only once the banner itself would have been
    // eligible and the per-version notification rate limit has passed.
    // Re-check on a short poll so the banner appears promptly once the
    // window regains focus.
    if !signals.window_active {
        let notify = match &eligible {
            Eligibility::Ready => {
                let rate_ok = state
                    .last_notification_at(&candidate.version)
                    .map_or(true, |last| {
                        now_ms.saturating_sub(last) >= timing.notify_rate_limit_ms
                    });
                rate_ok.then(|| NotifyIntent::for_candidate(candidate))
            }
            Eligibility::Wait(_) => None,
        };
        return Evaluation {
            visible: false,
            notify,
            reschedule: Some(timing.inactive_poll_ms),
        };
    }

    // Rule 9: cadence. Wake exactly when eligibility is reached.
    if let Eligibility::Wait(remaining) = eligible {
        return Evaluation::hidden(Some(remaining));
    }

    // Rule 10: show it.
    Evaluation {
        visible: true,
        notify: None,
        reschedule: None,
    }
}
