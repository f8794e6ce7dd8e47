// Output formatting helpers

use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Display;

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}

pub fn print_success(message: impl Display) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_info(message: impl Display) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print one record as an indented field list, `ID` first
pub fn print_record(record: &Map<String, Value>) {
    let id = record.get("ID").map(plain).unwrap_or_else(|| "?".into());
    println!("{} {}", "Registro".bold(), id.bold());
    for (name, value) in record.iter().filter(|(name, _)| *name != "ID") {
        println!("  {}: {}", name.dimmed(), plain(value));
    }
}

/// Strings without quotes, everything else as JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
