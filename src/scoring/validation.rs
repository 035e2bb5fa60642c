use thiserror::Error;

use super::config::ScoringConfig;

/// Rejected placement tables. Checks run in a fixed order and the first rule
/// broken wins, so callers always see one deterministic kind for a given
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("scoring table has no placements")]
    EmptyConfig,
    #[error("placement {0} is not a positive integer")]
    NonPositivePlacement(u32),
    #[error("scoring table must start at placement 1")]
    MissingFirstPlace,
    #[error("placements must be contiguous: no placement {0}")]
    NonContiguousPlacements(u32),
    #[error("placement {placement} awards negative points ({points})")]
    NegativePoints { placement: u32, points: i64 },
}

/// Validate a placement table: non-empty, keys exactly `{1..N}`, no negative
/// points. Zero points is allowed — a placement may legitimately score
/// nothing.
///
/// Deterministic and side-effect free. Runs wherever a table enters the
/// system: event create, event update, and `default_scoring` in config.yaml.
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), ScoringError> {
    if config.is_empty() {
        return Err(ScoringError::EmptyConfig);
    }
    // Placement 0 is the only non-positive value a u32 key can hold.
    if config.contains(0) {
        return Err(ScoringError::NonPositivePlacement(0));
    }
    // Keys iterate sorted, so the shape checks are one walk: starts at 1,
    // then no gaps between neighbors.
    let mut expected = 1;
    for placement in config.placements() {
        if expected == 1 && placement != 1 {
            return Err(ScoringError::MissingFirstPlace);
        }
        if placement != expected {
            return Err(ScoringError::NonContiguousPlacements(expected));
        }
        expected = placement + 1;
    }
    for (placement, points) in config.entries() {
        if points < 0 {
            return Err(ScoringError::NegativePoints { placement, points });
        }
    }
    Ok(())
}
