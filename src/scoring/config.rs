use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placement → points table for one event.
///
/// Keys are placements (1 = first place), values are the points awarded to
/// whoever takes that placement. Backed by an ordered map so iteration is
/// always podium order. Construction does not check shape; run
/// [`validate_scoring`](super::validate_scoring) before trusting a table.
///
/// Example YAML (as it appears under `default_scoring` in config.yaml):
/// ```yaml
/// 1: 10
/// 2: 6
/// 3: 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoringConfig(BTreeMap<u32, i64>);

impl ScoringConfig {
    pub fn new(entries: impl IntoIterator<Item = (u32, i64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Parse the compact flag form: `"1=10,2=6,3=3"`.
    pub fn parse(input: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (placement, points) = part
                .split_once('=')
                .with_context(|| format!("Expected <placement>=<points>, got \"{}\"", part))?;
            let placement: u32 = placement
                .trim()
                .parse()
                .with_context(|| format!("Invalid placement \"{}\"", placement.trim()))?;
            let points: i64 = points
                .trim()
                .parse()
                .with_context(|| format!("Invalid points \"{}\"", points.trim()))?;
            if entries.insert(placement, points).is_some() {
                bail!("Placement {} listed twice", placement);
            }
        }
        Ok(Self(entries))
    }

    /// Points for a placement, if the table scores it.
    pub fn points_for(&self, placement: u32) -> Option<i64> {
        self.0.get(&placement).copied()
    }

    pub fn contains(&self, placement: u32) -> bool {
        self.0.contains_key(&placement)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(placement, points)` pairs in ascending placement order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, i64)> + '_ {
        self.0.iter().map(|(placement, points)| (*placement, *points))
    }

    /// Placements in ascending order.
    pub fn placements(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }
}

impl Default for ScoringConfig {
    /// Podium table used when an event is created without an explicit one.
    fn default() -> Self {
        Self::new([(1, 10), (2, 6), (3, 3), (4, 1)])
    }
}

impl fmt::Display for ScoringConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (placement, points) in self.entries() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", placement, points)?;
            first = false;
        }
        Ok(())
    }
}
