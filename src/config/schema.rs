use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::ScoringConfig;

/// Contents of ~/.config/house-cup/config.yaml. Every field is optional; a
/// missing file means all defaults.
///
/// Example YAML:
/// ```yaml
/// data_path: /shared/family/competition.json
/// default_scoring:
///   1: 10
///   2: 6
///   3: 3
///   4: 1
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the competition data file lives. Overridden by --data.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Scoring table for events created without an explicit --scoring.
    /// Must pass scoring validation; checked at load time.
    #[serde(default)]
    pub default_scoring: Option<ScoringConfig>,
}
