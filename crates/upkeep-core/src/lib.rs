//! # Upkeep Core Library
//!
//! Core logic for the Upkeep update-reminder engine. All behavior lives
//! here and is exercised by the standalone CLI binary; a desktop shell
//! would be a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Evaluator**: A pure decision function over wall-clock epoch ms —
//!   given a candidate, the persisted suppression state and the current
//!   environment signals, it decides visible/notify/reschedule
//! - **Controller**: A single-task scheduler loop that owns exactly one
//!   pending deadline and applies the evaluator's intent
//! - **Storage**: SQLite kv-backed suppression state and TOML configuration
//! - **Sources**: Local feed file, remote HTTP manifest, operator mock
//!
//! ## Key Components
//!
//! - [`evaluate`]: The reminder decision function
//! - [`ReminderController`]: Scheduler loop driving the reminder
//! - [`ReminderStore`]: Persisted per-version suppression state
//! - [`Config`]: Application configuration management

pub mod candidate;
pub mod error;
pub mod events;
pub mod feed;
pub mod notify;
pub mod reminder;
pub mod remote;
pub mod signals;
pub mod storage;

pub use candidate::{CandidateSource, DetectionLedger, ReminderCandidate};
pub use error::{ConfigError, CoreError, NotifyError, SourceError, StorageError};
pub use events::Event;
pub use feed::{FeedUpdate, LocalFeedSource};
pub use notify::{BackgroundBehavior, BackgroundNotifier, LogChannel, NotificationChannel};
pub use reminder::{
    evaluate, ControllerEvent, ControllerHandle, DisplayState, Evaluation, NotifyIntent,
    ReminderController, ReminderTiming, SnoozeOption, UserAction, SNOOZE_OPTIONS,
};
pub use remote::{HttpManifestSource, NullRemoteSource, RemoteSource, RemoteUpdate};
pub use signals::{SharedSignals, SignalSource, Signals, StaticSignals};
pub use storage::{
    data_dir, BackgroundConfig, Config, Database, ReminderState, ReminderStore, ReminderStyle,
    SourcesConfig,
};
