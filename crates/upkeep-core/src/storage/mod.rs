mod config;
mod database;
mod state;

pub use config::{BackgroundConfig, Config, SourcesConfig};
pub use database::Database;
pub use state::{ReminderState, ReminderStore, ReminderStyle};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/upkeep[-dev]/` based on UPKEEP_ENV.
///
/// Set UPKEEP_ENV=dev to use the development data directory, or
/// UPKEEP_DATA_DIR to point at an arbitrary directory (used by tests).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = if let Ok(explicit) = std::env::var("UPKEEP_DATA_DIR") {
        PathBuf::from(explicit)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");

        let env = std::env::var("UPKEEP_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("upkeep-dev")
        } else {
            base_dir.join("upkeep")
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
