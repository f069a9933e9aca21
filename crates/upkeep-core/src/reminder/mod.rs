mod controller;
mod display;
mod evaluator;

pub use controller::{ControllerEvent, ControllerHandle, ReminderController};
pub use display::{DisplayState, SnoozeOption, UserAction, SNOOZE_OPTIONS};
pub use evaluator::{evaluate, Evaluation, NotifyIntent, ReminderTiming};

/// Current wall-clock time in ms since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
