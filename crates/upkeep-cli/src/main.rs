use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "upkeep-cli", version, about = "Upkeep update reminder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persisted reminder state
    State {
        #[command(subcommand)]
        action: commands::state::StateAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Operator mock candidate
    Mock {
        #[command(subcommand)]
        action: commands::mock::MockAction,
    },
    /// Evaluate the reminder decision once and print it as JSON
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Snooze a version (preset 1h/1d/1w, a ms count, or e.g. "m:30")
    Snooze {
        version: String,
        duration: String,
    },
    /// Dismiss a version permanently
    Dismiss {
        version: String,
    },
    /// Pause all reminding for a duration (ms count or e.g. "h:2")
    Pause {
        duration: String,
    },
    /// Resume reminding after a pause
    Resume,
    /// Set the reminder presentation style
    Style {
        #[arg(value_parser = ["card", "toast"])]
        style: String,
    },
    /// Run the reminder loop, printing events as JSON lines
    Watch(commands::watch::WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::State { action } => commands::state::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Mock { action } => commands::mock::run(action),
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Snooze { version, duration } => commands::actions::snooze(&version, &duration),
        Commands::Dismiss { version } => commands::actions::dismiss(&version),
        Commands::Pause { duration } => commands::actions::pause(&duration),
        Commands::Resume => commands::actions::resume(),
        Commands::Style { style } => commands::actions::style(&style),
        Commands::Watch(args) => commands::watch::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
