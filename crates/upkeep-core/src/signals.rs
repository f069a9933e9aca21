//! Environment signals consumed by the evaluator.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Snapshot of the environment at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Host window is visible and focused.
    pub window_active: bool,
    /// A fullscreen app is in front (only consulted when the
    /// fullscreen-guard setting is enabled).
    pub fullscreen_busy: bool,
    /// An update install/apply is already underway.
    pub update_in_progress: bool,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            window_active: true,
            fullscreen_busy: false,
            update_in_progress: false,
        }
    }
}

/// Supplies the current environment snapshot. Implemented by the host
/// (window focus, fullscreen detection, update-apply subsystem).
pub trait SignalSource: Send {
    fn sample(&self) -> Signals;
}

/// Fixed signals, for hosts without environment probes and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSignals(pub Signals);

impl SignalSource for StaticSignals {
    fn sample(&self) -> Signals {
        self.0
    }
}

/// Cheaply cloneable signal cell a host can write into from its own
/// event handlers while the controller reads from the other end.
#[derive(Debug, Clone, Default)]
pub struct SharedSignals(Arc<Mutex<Signals>>);

impl SharedSignals {
    pub fn new(initial: Signals) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    pub fn set_window_active(&self, active: bool) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).window_active = active;
    }

    pub fn set_fullscreen_busy(&self, busy: bool) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).fullscreen_busy = busy;
    }

    pub fn set_update_in_progress(&self, in_progress: bool) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).update_in_progress = in_progress;
    }
}

impl SignalSource for SharedSignals {
    fn sample(&self) -> Signals {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_assumes_active_window() {
        let s = Signals::default();
        assert!(s.window_active);
        assert!(!s.fullscreen_busy);
        assert!(!s.update_in_progress);
    }

    #[test]
    fn shared_signals_propagate_writes() {
        let shared = SharedSignals::default();
        shared.set_window_active(false);
        shared.set_update_in_progress(true);
        let sampled = shared.sample();
        assert!(!sampled.window_active);
        assert!(sampled.update_in_progress);
    }
}
