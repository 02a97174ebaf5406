//! Winning entry seed file
//!
//! A JSON array of `{ "id", "prize_number", "ticket_number", "name" }`
//! objects. Entries always start unclaimed.

use anyhow::{Context, Result};
use portal_common::WinningEntry;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedEntry {
    id: String,
    prize_number: String,
    ticket_number: String,
    name: String,
}

impl From<SeedEntry> for WinningEntry {
    fn from(seed: SeedEntry) -> Self {
        WinningEntry::new(seed.id, seed.prize_number, seed.ticket_number, seed.name)
    }
}

/// Read and parse a seed file
pub fn load_entries(path: &Path) -> Result<Vec<WinningEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

    let seeds: Vec<SeedEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid seed file: {}", path.display()))?;

    for seed in &seeds {
        if seed.id.trim().is_empty() || seed.prize_number.trim().is_empty() {
            anyhow::bail!("Seed entries need a non-empty id and prize_number");
        }
    }

    Ok(seeds.into_iter().map(WinningEntry::from).collect())
}
