use clap::Subcommand;
use upkeep_core::feed::parse_duration_ms;
use upkeep_core::{ReminderCandidate, ReminderStore};

#[derive(Subcommand)]
pub enum MockAction {
    /// Inject a mock candidate (wins over every real source)
    Set {
        version: String,
        /// Notification/banner title
        #[arg(long)]
        title: Option<String>,
        /// Changelog body; first paragraph becomes the snippet
        #[arg(long)]
        body: Option<String>,
        /// Override the repeat cadence: ms count or unit-first, e.g. "h:2"
        #[arg(long)]
        interval: Option<String>,
    },
    /// Remove the mock candidate
    Clear,
    /// Print the stored mock candidate, if any
    Show,
}

pub fn run(action: MockAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ReminderStore::open()?;
    match action {
        MockAction::Set {
            version,
            title,
            body,
            interval,
        } => {
            let mut candidate = ReminderCandidate::mock(&version, body.as_deref());
            candidate.title = title;
            if let Some(interval) = interval {
                let ms = parse_duration_ms(&interval)
                    .ok_or_else(|| format!("invalid duration: {interval}"))?;
                candidate.interval_override_ms = Some(ms);
            }
            store.set_mock(&candidate)?;
            println!("{}", serde_json::to_string_pretty(&candidate)?);
        }
        MockAction::Clear => {
            store.clear_mock()?;
            println!("mock cleared");
        }
        MockAction::Show => match store.mock() {
            Some(candidate) => println!("{}", serde_json::to_string_pretty(&candidate)?),
            None => println!("no mock candidate"),
        },
    }
    Ok(())
}
