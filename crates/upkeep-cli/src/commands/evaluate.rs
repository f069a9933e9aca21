use std::time::{SystemTime, UNIX_EPOCH};

use clap::Args;
use upkeep_core::{
    evaluate, Config, DetectionLedger, LocalFeedSource, ReminderCandidate, ReminderStore, Signals,
};

#[derive(Args)]
pub struct EvaluateArgs {
    /// Evaluate as if the window were inactive
    #[arg(long)]
    pub window_inactive: bool,
    /// Evaluate as if a fullscreen app were in front
    #[arg(long)]
    pub fullscreen: bool,
    /// Evaluate as if an update install were underway
    #[arg(long)]
    pub in_progress: bool,
}

/// One-shot decision over the stored mock or the local feed. Useful for
/// inspecting why the reminder is (not) showing. The detection ledger is
/// process-local, so a fresh invocation sees the candidate as newly
/// detected.
pub fn run(args: EvaluateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = ReminderStore::open()?;
    let config = Config::load()?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mock = store.mock();
    let feed = LocalFeedSource::default_location()?.read();
    let candidate = match (&mock, &feed) {
        (Some(mock), _) => Some(mock.clone()),
        (None, Some(feed)) => Some(ReminderCandidate::from_feed(feed)),
        (None, None) => None,
    };

    let mut ledger = DetectionLedger::new();
    if let Some(c) = &candidate {
        ledger.observe(&c.detection_key, now);
    }

    let signals = Signals {
        window_active: !args.window_inactive,
        fullscreen_busy: args.fullscreen,
        update_in_progress: args.in_progress,
    };

    let evaluation = evaluate(
        candidate.as_ref(),
        store.state(),
        &ledger,
        signals,
        &config.timing,
        now,
    );
    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}
