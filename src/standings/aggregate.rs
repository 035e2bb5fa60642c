use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{Event, EventKind, House, Player};

/// One house's line in the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseScore {
    pub house_id: String,
    pub total_score: i64,
    /// Number of first places taken across all completed events.
    pub events_won: u32,
    /// Points per event category id, created on first touch. Keys come from
    /// the events verbatim, so an id that no longer resolves to a Category
    /// still carries its points.
    pub category_breakdown: BTreeMap<String, i64>,
}

/// One player's line in the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerScore {
    pub player_id: String,
    pub house_id: String,
    pub total_score: i64,
    pub events_won: u32,
}

/// Output of [`aggregate`]: both leaderboards, already sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    pub houses: Vec<HouseScore>,
    pub players: Vec<PlayerScore>,
}

/// Fold every completed event into house and player standings.
///
/// Pure: same snapshot in, same standings out; recomputed in full on every
/// call. Only events that are completed with a non-empty result list count.
/// Individual events credit the placing player and that player's house;
/// group events credit the placed house directly. First place also bumps
/// `events_won` on whoever it credits.
///
/// Both leaderboards sort by total descending. The sort is stable and no
/// secondary key is applied, so equal totals keep the input order — houses
/// and players listed in roster order rank in roster order on ties.
///
/// Malformed references never fail the computation: players whose house is
/// unknown get no standings row (orphaned data), and any result whose
/// participant does not resolve is skipped on the unresolved side only.
pub fn aggregate(houses: &[House], players: &[Player], events: &[Event]) -> Standings {
    let mut house_rows: Vec<HouseScore> = houses
        .iter()
        .map(|house| HouseScore {
            house_id: house.id.clone(),
            total_score: 0,
            events_won: 0,
            category_breakdown: BTreeMap::new(),
        })
        .collect();
    let house_index: HashMap<&str, usize> = houses
        .iter()
        .enumerate()
        .map(|(slot, house)| (house.id.as_str(), slot))
        .collect();

    let mut player_rows: Vec<PlayerScore> = Vec::new();
    let mut player_index: HashMap<&str, usize> = HashMap::new();
    for player in players {
        if !house_index.contains_key(player.house_id.as_str()) {
            continue;
        }
        player_index.insert(player.id.as_str(), player_rows.len());
        player_rows.push(PlayerScore {
            player_id: player.id.clone(),
            house_id: player.house_id.clone(),
            total_score: 0,
            events_won: 0,
        });
    }

    for event in events.iter().filter(|event| event.is_scored()) {
        let results = event.results.as_deref().unwrap_or(&[]);
        for result in results {
            let points = event.scoring.points_for(result.placement).unwrap_or(0);
            let won = result.placement == 1;
            match event.kind {
                EventKind::Individual => {
                    // Credit the player, then the player's house with the
                    // same points under the event's category.
                    if let Some(&slot) = player_index.get(result.participant_id.as_str()) {
                        let row = &mut player_rows[slot];
                        row.total_score += points;
                        if won {
                            row.events_won += 1;
                        }
                        let house_id = row.house_id.clone();
                        credit_house(
                            &mut house_rows,
                            &house_index,
                            &house_id,
                            &event.category_id,
                            points,
                            won,
                        );
                    }
                }
                EventKind::Group => {
                    credit_house(
                        &mut house_rows,
                        &house_index,
                        &result.participant_id,
                        &event.category_id,
                        points,
                        won,
                    );
                }
            }
        }
    }

    // sort_by is stable: equal totals keep insertion order.
    house_rows.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    player_rows.sort_by(|a, b| b.total_score.cmp(&a.total_score));

    Standings {
        houses: house_rows,
        players: player_rows,
    }
}

/// Player standings restricted to one category.
///
/// The filter narrows which *players* appear, not which events count: a
/// kids-category player who also placed in an open individual event keeps
/// those points here. Sorted by total descending with ascending player name
/// as tie-break — the tie-break exists only in this filtered view.
pub fn category_standings(
    category_id: &str,
    houses: &[House],
    players: &[Player],
    events: &[Event],
) -> Vec<PlayerScore> {
    let in_category: HashSet<&str> = players
        .iter()
        .filter(|player| player.category_id == category_id)
        .map(|player| player.id.as_str())
        .collect();
    let names: HashMap<&str, &str> = players
        .iter()
        .map(|player| (player.id.as_str(), player.full_name.as_str()))
        .collect();

    let mut rows: Vec<PlayerScore> = aggregate(houses, players, events)
        .players
        .into_iter()
        .filter(|row| in_category.contains(row.player_id.as_str()))
        .collect();

    rows.sort_by(|a, b| {
        b.total_score.cmp(&a.total_score).then_with(|| {
            let a_name = names.get(a.player_id.as_str()).copied().unwrap_or("");
            let b_name = names.get(b.player_id.as_str()).copied().unwrap_or("");
            a_name.cmp(b_name)
        })
    });
    rows
}

fn credit_house(
    rows: &mut [HouseScore],
    index: &HashMap<&str, usize>,
    house_id: &str,
    category_id: &str,
    points: i64,
    won: bool,
) {
    if let Some(&slot) = index.get(house_id) {
        let row = &mut rows[slot];
        row.total_score += points;
        *row
            .category_breakdown
            .entry(category_id.to_string())
            .or_insert(0) += points;
        if won {
            row.events_won += 1;
        }
    }
}
