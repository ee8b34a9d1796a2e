use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{HouseholdDetail, Snapshot};

pub const BACKUP_VERSION: &str = "1.0.0";

/// CSV of households with category/tier names resolved. Field quoting and
/// escaping are the writer's job.
pub fn households_to_csv(rows: &[HouseholdDetail]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["Household Name", "Guest Count", "Category", "Tier"])?;
    for r in rows {
        let count = r.guest_count.to_string();
        wtr.write_record([r.name.as_str(), count.as_str(), r.category.as_str(), r.tier.as_str()])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error()).context("flushing CSV writer")?;
    Ok(String::from_utf8(bytes)?)
}

/// On-disk backup format: a versioned, timestamped database snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub version: String,
    pub exported_at: String,
    #[serde(flatten)]
    pub data: Snapshot,
}

pub fn make_backup(data: Snapshot) -> Backup {
    Backup {
        version: BACKUP_VERSION.to_string(),
        exported_at: Utc::now().to_rfc3339(),
        data,
    }
}

pub fn backup_to_json(backup: &Backup) -> Result<String> {
    Ok(serde_json::to_string_pretty(backup)?)
}

/// Parse and validate a backup file. Validation messages are shown to the
/// user verbatim, so they name the offending record.
pub fn parse_backup(json: &str) -> Result<Backup> {
    let backup: Backup = serde_json::from_str(json).context("not a valid backup file")?;
    validate(&backup.data)?;
    Ok(backup)
}

fn validate(snap: &Snapshot) -> Result<()> {
    let category_ids: Vec<i64> = snap.categories.iter().map(|c| c.id).collect();
    let tier_ids: Vec<i64> = snap.tiers.iter().map(|t| t.id).collect();
    let event_ids: Vec<i64> = snap.events.iter().map(|e| e.id).collect();

    for h in &snap.households {
        if h.guest_count < 1 {
            bail!("household \"{}\" has a guest count below 1", h.name);
        }
        if !category_ids.contains(&h.category_id) {
            bail!("household \"{}\" references an unknown category", h.name);
        }
        if !tier_ids.contains(&h.tier_id) {
            bail!("household \"{}\" references an unknown tier", h.name);
        }
    }
    for s in &snap.selections {
        if !event_ids.contains(&s.event_id)
            || !category_ids.contains(&s.category_id)
            || !tier_ids.contains(&s.tier_id)
        {
            bail!("event selection references an unknown event, category, or tier");
        }
    }
    Ok(())
}

// ── Tests ──
