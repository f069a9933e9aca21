//! One-shot suppression actions against the persisted state.

use std::time::{SystemTime, UNIX_EPOCH};

use upkeep_core::feed::parse_duration_ms;
use upkeep_core::{ReminderStore, ReminderStyle, SNOOZE_OPTIONS};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Preset label ("1h", "1d", "1w") or the feed duration grammar.
fn duration_ms(value: &str) -> Result<u64, String> {
    if let Some(preset) = SNOOZE_OPTIONS.iter().find(|o| o.label == value) {
        return Ok(preset.duration_ms);
    }
    parse_duration_ms(value).ok_or_else(|| format!("invalid duration: {value}"))
}

pub fn snooze(version: &str, duration: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ms = duration_ms(duration)?;
    let until = now_ms().saturating_add(ms);
    let mut store = ReminderStore::open()?;
    store.snooze(version, until);
    println!("{version} snoozed until {until}");
    Ok(())
}

pub fn dismiss(version: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ReminderStore::open()?;
    store.dismiss(version);
    println!("{version} dismissed");
    Ok(())
}

pub fn pause(duration: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ms = duration_ms(duration)?;
    let until = now_ms().saturating_add(ms);
    let mut store = ReminderStore::open()?;
    store.set_manual_pause_until(until);
    println!("reminders paused until {until}");
    Ok(())
}

pub fn resume() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ReminderStore::open()?;
    store.set_manual_pause_until(0);
    println!("reminders resumed");
    Ok(())
}

pub fn style(style: &str) -> Result<(), Box<dyn std::error::Error>> {
    let style = match style {
        "card" => ReminderStyle::Card,
        "toast" => ReminderStyle::Toast,
        other => return Err(format!("unknown style: {other}").into()),
    };
    let mut store = ReminderStore::open()?;
    store.set_style(style);
    println!("style set");
    Ok(())
}
