use std::path::PathBuf;

use clap::Args;
use tracing_subscriber::EnvFilter;
use upkeep_core::{
    BackgroundNotifier, Config, ControllerEvent, HttpManifestSource, LocalFeedSource, LogChannel,
    ReminderController, ReminderStore, Signals, StaticSignals,
};

#[derive(Args)]
pub struct WatchArgs {
    /// Remote manifest URL (overrides the configured one)
    #[arg(long)]
    pub manifest_url: Option<String>,
    /// Watch a feed file at this path instead of the data directory
    #[arg(long)]
    pub feed: Option<PathBuf>,
}

/// Run the full reminder loop in the foreground. Notifications go to the
/// log; every event is printed as one JSON line. Ctrl-C stops the loop.
pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(args))
}

async fn watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = ReminderStore::open()?;
    let mut config = Config::load()?;

    if args.manifest_url.is_some() {
        config.sources.manifest_url = args.manifest_url;
    }
    let remote = config
        .sources
        .manifest_url
        .clone()
        .map(HttpManifestSource::new);

    let feed = match args.feed {
        Some(path) => {
            config.sources.feed_enabled = true;
            Some(LocalFeedSource::new(path))
        }
        None => {
            if config.sources.feed_enabled {
                Some(LocalFeedSource::default_location()?)
            } else {
                None
            }
        }
    };

    let notifier = BackgroundNotifier::new(LogChannel, config.background.behavior);
    let (mut controller, handle) = ReminderController::new(
        store,
        config,
        remote,
        feed,
        StaticSignals(Signals::default()),
        notifier,
    );
    let mut events = controller
        .take_events()
        .ok_or("event stream already taken")?;
    let task = tokio::spawn(controller.run());

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => println!("{}", serde_json::to_string(&event)?),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.send(ControllerEvent::Shutdown).await;
                break;
            }
        }
    }

    task.await?;
    Ok(())
}
