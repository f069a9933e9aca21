use clap::Subcommand;
use upkeep_core::ReminderStore;

#[derive(Subcommand)]
pub enum StateAction {
    /// Print the persisted reminder state as JSON
    Show,
    /// Discard all suppression history
    Reset,
}

pub fn run(action: StateAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ReminderStore::open()?;
    match action {
        StateAction::Show => {
            println!("{}", serde_json::to_string_pretty(store.state())?);
        }
        StateAction::Reset => {
            store.reset();
            println!("state reset to defaults");
        }
    }
    Ok(())
}
