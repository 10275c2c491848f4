//! Profile listing, retrieval and deletion.
//!
//! Used by the `intake list`, `intake get` and `intake delete` commands.

use anyhow::{bail, Result};

use herd_intake_core::models::Profile;

use crate::config::Config;
use crate::db;

/// One-line listing entry.
pub fn summary_line(profile: &Profile) -> String {
    format!(
        "{}  {}  {:<20} {:>5} {:<10} risk={:<6} valuation={:.0}",
        profile.id,
        profile.created_at.format("%Y-%m-%d %H:%M"),
        truncate(&profile.farmer_name, 20),
        profile.livestock.count,
        truncate(&profile.livestock.species, 10),
        profile.risk_rating.as_str(),
        profile.valuation
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        t.push('~');
        t
    }
}

pub async fn run_list(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;

    if store.count() == 0 {
        println!("No profiles stored.");
        return Ok(());
    }

    for profile in store.list() {
        println!("{}", summary_line(profile));
    }
    println!("{} profile(s)", store.count());
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let Some(profile) = store.get(id) else {
        bail!("profile not found: {}", id);
    };
    println!("{}", serde_json::to_string_pretty(profile)?);
    Ok(())
}

/// Deletes `id`. Deleting an unknown profile succeeds and changes nothing.
pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let mut store = db::open_store(config).await?;
    let removed = store.delete(id).await?;
    if removed == 0 {
        println!("No profile with id {}", id);
    } else {
        println!("Deleted {}", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Ann", 5), "Ann");
        assert_eq!(truncate("Bartholomew", 5), "Bart~");
        assert_eq!(truncate("Éamonn Ó", 8), "Éamonn Ó");
    }
}
