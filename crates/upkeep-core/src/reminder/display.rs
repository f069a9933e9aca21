//! Hidden/Visible presentation state.
//!
//! Hidden -> Visible happens only through the evaluator's final rule.
//! Visible -> Hidden happens through exactly one [`UserAction`]; each
//! action determines the delay the controller re-arms with, superseding
//! whatever the evaluator had previously scheduled.

use serde::{Deserialize, Serialize};

/// What the user is (or isn't) looking at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Hidden,
    Visible {
        version: String,
        /// Epoch ms when the reminder became visible.
        since_ms: u64,
    },
}

impl DisplayState {
    pub fn is_visible(&self) -> bool {
        matches!(self, DisplayState::Visible { .. })
    }

    /// The version currently on screen, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            DisplayState::Visible { version, .. } => Some(version),
            DisplayState::Hidden => None,
        }
    }
}

/// How the user dismissed a visible reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "action", content = "duration_ms")]
pub enum UserAction {
    /// Open the full update view. Next check at full cadence.
    Details,
    /// Hide for the given duration, then remind again.
    Snooze(u64),
    /// Never remind about this version again.
    Skip,
    /// Close without choosing. Reappears after the cadence elapses.
    Close,
    /// Toast timed out. Same as close; only the toast style uses it.
    AutoDismiss,
}

/// A snooze duration offered by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnoozeOption {
    pub duration_ms: u64,
    pub label: &'static str,
}

/// The snooze durations the banner offers.
pub const SNOOZE_OPTIONS: [SnoozeOption; 3] = [
    SnoozeOption {
        duration_ms: 60 * 60 * 1000,
        label: "1h",
    },
    SnoozeOption {
        duration_ms: 24 * 60 * 60 * 1000,
        label: "1d",
    },
    SnoozeOption {
        duration_ms: 7 * 24 * 60 * 60 * 1000,
        label: "1w",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_hidden() {
        let state = DisplayState::default();
        assert!(!state.is_visible());
        assert!(state.version().is_none());
    }

    #[test]
    fn visible_exposes_version() {
        let state = DisplayState::Visible {
            version: "1.2.3".into(),
            since_ms: 99,
        };
        assert!(state.is_visible());
        assert_eq!(state.version(), Some("1.2.3"));
    }

    #[test]
    fn snooze_options_are_ascending() {
        assert!(SNOOZE_OPTIONS.windows(2).all(|w| w[0].duration_ms < w[1].duration_ms));
    }
}
