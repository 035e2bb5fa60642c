//! Roster import: competition setup (houses, categories, players) arrives as
//! one YAML file whose entries reference each other by display name. Import
//! resolves those names to store ids and creates the records through the
//! persistence port.
//!
//! All validation happens before the first write, so a bad roster file leaves
//! the store untouched.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::model::{parse_hex_color, Category, House, Player};
use crate::store::CompetitionStore;

/// A roster file as written by the person setting up the competition.
///
/// ```yaml
/// houses:
///   - name: Emerald
///     color: "#2ECC71"
/// categories:
///   - name: kids
///     label: Kids (under 12)
/// players:
///   - name: Ana Flores
///     house: Emerald
///     category: kids
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterFile {
    #[serde(default)]
    pub houses: Vec<HouseEntry>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HouseEntry {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryEntry {
    /// Machine key, e.g. "kids".
    pub name: String,
    /// Display label; defaults to the name.
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerEntry {
    pub name: String,
    /// House name, resolved against this file and the existing roster.
    pub house: String,
    /// Category name, resolved the same way.
    pub category: String,
}

/// What an import created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub houses: usize,
    pub categories: usize,
    pub players: usize,
}

/// Read and parse a roster YAML file.
pub fn load_roster(path: &Path) -> Result<RosterFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file at {}", path.display()))?;
    let roster: RosterFile = serde_saphyr::from_str(&content).with_context(|| {
        format!("Failed to parse roster: invalid YAML in {}", path.display())
    })?;
    Ok(roster)
}

/// Create the roster's records through the store.
///
/// Names must be new: an entry whose name (case-insensitive) already exists
/// in the store or earlier in the file is rejected. Player `house` and
/// `category` references may resolve against either this file or records
/// already in the store, so a later import can add players to existing
/// houses.
pub fn import_roster(store: &dyn CompetitionStore, roster: &RosterFile) -> Result<ImportSummary> {
    let existing_houses = store.houses()?;
    let existing_categories = store.categories()?;
    let existing_players = store.players()?;

    // Name → id, seeded with what the store already has. New entries are
    // registered with an empty id during validation and patched after create.
    let mut house_ids: HashMap<String, String> = existing_houses
        .iter()
        .map(|h| (h.name.trim().to_lowercase(), h.id.clone()))
        .collect();
    let mut category_ids: HashMap<String, String> = existing_categories
        .iter()
        .map(|c| (c.name.trim().to_lowercase(), c.id.clone()))
        .collect();
    let mut player_names: HashSet<String> = existing_players
        .iter()
        .map(|p| p.full_name.trim().to_lowercase())
        .collect();

    for entry in &roster.houses {
        let key = checked_name(&entry.name, "house")?;
        if house_ids.contains_key(&key) {
            bail!("House \"{}\" already exists", entry.name.trim());
        }
        if parse_hex_color(&entry.color).is_none() {
            bail!(
                "House \"{}\" has invalid color \"{}\" (expected #RRGGBB)",
                entry.name.trim(),
                entry.color
            );
        }
        house_ids.insert(key, String::new());
    }

    for entry in &roster.categories {
        let key = checked_name(&entry.name, "category")?;
        if category_ids.contains_key(&key) {
            bail!("Category \"{}\" already exists", entry.name.trim());
        }
        category_ids.insert(key, String::new());
    }

    for entry in &roster.players {
        let key = checked_name(&entry.name, "player")?;
        if player_names.contains(&key) {
            bail!("Player \"{}\" already exists", entry.name.trim());
        }
        player_names.insert(key);

        if !house_ids.contains_key(&entry.house.trim().to_lowercase()) {
            bail!(
                "Player \"{}\" references unknown house \"{}\"",
                entry.name.trim(),
                entry.house
            );
        }
        if !category_ids.contains_key(&entry.category.trim().to_lowercase()) {
            bail!(
                "Player \"{}\" references unknown category \"{}\"",
                entry.name.trim(),
                entry.category
            );
        }
    }

    // Everything checks out; now write, houses and categories first so player
    // references resolve to real ids.
    for entry in &roster.houses {
        let id = store.create_house(House {
            id: String::new(),
            name: entry.name.trim().to_string(),
            color: entry.color.clone(),
        })?;
        house_ids.insert(entry.name.trim().to_lowercase(), id);
    }

    for entry in &roster.categories {
        let name = entry.name.trim().to_string();
        let label = entry
            .label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(&name)
            .to_string();
        let id = store.create_category(Category {
            id: String::new(),
            name: name.clone(),
            label,
        })?;
        category_ids.insert(name.to_lowercase(), id);
    }

    for entry in &roster.players {
        let house_id = house_ids[&entry.house.trim().to_lowercase()].clone();
        let category_id = category_ids[&entry.category.trim().to_lowercase()].clone();
        store.create_player(Player {
            id: String::new(),
            full_name: entry.name.trim().to_string(),
            category_id,
            house_id,
        })?;
    }

    let summary = ImportSummary {
        houses: roster.houses.len(),
        categories: roster.categories.len(),
        players: roster.players.len(),
    };
    info!(
        "imported {} houses, {} categories, {} players",
        summary.houses, summary.categories, summary.players
    );
    Ok(summary)
}

fn checked_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("A {} entry has an empty name", what);
    }
    Ok(trimmed.to_lowercase())
}
