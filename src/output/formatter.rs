use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::collections::HashMap;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::model::{resolve_participant, Category, Event, EventStatus, House, Player};
use crate::standings::{HouseScore, PlayerScore};

/// Check if stdout is a TTY (for auto-detecting color support).
/// NO_COLOR, when set, wins.
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Medal tints for the top three rows of a leaderboard.
const GOLD: (u8, u8, u8) = (255, 200, 60);
const SILVER: (u8, u8, u8) = (190, 190, 200);
const BRONZE: (u8, u8, u8) = (205, 127, 80);

fn medal(rank: usize) -> Option<(u8, u8, u8)> {
    match rank {
        1 => Some(GOLD),
        2 => Some(SILVER),
        3 => Some(BRONZE),
        _ => None,
    }
}

/// Tint a house name with its roster color; falls back to plain text when the
/// stored color is malformed.
fn paint_house(name: &str, house: Option<&House>, use_colors: bool) -> String {
    if !use_colors {
        return name.to_string();
    }
    match house.and_then(House::rgb) {
        Some((r, g, b)) => name.truecolor(r, g, b).to_string(),
        None => name.to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn house_by_id<'a>(houses: &'a [House], id: &str) -> Option<&'a House> {
    houses.iter().find(|house| house.id == id)
}

/// Format the house leaderboard, one line per house:
/// "{rank}. {name} {total} pts {won} won  {breakdown}"
/// Breakdown entries use category labels; an id with no matching category
/// shows as the raw id.
pub fn format_house_table(
    rows: &[HouseScore],
    houses: &[House],
    categories: &[Category],
    use_colors: bool,
) -> String {
    if rows.is_empty() {
        return "No houses in the roster.".to_string();
    }

    let labels: HashMap<&str, &str> = categories
        .iter()
        .map(|category| (category.id.as_str(), category.label.as_str()))
        .collect();

    let name_width = rows
        .iter()
        .map(|row| {
            house_by_id(houses, &row.house_id)
                .map(|house| house.name.chars().count())
                .unwrap_or(row.house_id.chars().count())
        })
        .max()
        .unwrap_or(0);

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let rank = idx + 1;
            let house = house_by_id(houses, &row.house_id);
            let name = house.map(|h| h.name.as_str()).unwrap_or(&row.house_id);
            let name_padded = format!("{:<width$}", name, width = name_width);

            let breakdown = row
                .category_breakdown
                .iter()
                .map(|(category_id, points)| {
                    let label = labels
                        .get(category_id.as_str())
                        .copied()
                        .unwrap_or(category_id.as_str());
                    format!("{} {}", label, points)
                })
                .collect::<Vec<_>>()
                .join(" · ");

            let rank_str = format!("{:>2}.", rank);
            let total_str = format!("{:>5}", row.total_score);
            let won_str = format!("{:>2} won", row.events_won);

            if use_colors {
                let name_colored = paint_house(&name_padded, house, true);
                match medal(rank) {
                    Some((r, g, b)) => format!(
                        "{} {}  {} pts  {}  {}",
                        rank_str.truecolor(r, g, b).bold(),
                        name_colored,
                        total_str.bold(),
                        won_str,
                        breakdown.dimmed()
                    ),
                    None => format!(
                        "{} {}  {} pts  {}  {}",
                        rank_str.dimmed(),
                        name_colored,
                        total_str,
                        won_str,
                        breakdown.dimmed()
                    ),
                }
            } else {
                format!(
                    "{} {}  {} pts  {}  {}",
                    rank_str, name_padded, total_str, won_str, breakdown
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a player leaderboard, one line per row:
/// "{rank}. {player} ({house}) {total} pts {won} won"
pub fn format_player_table(
    rows: &[PlayerScore],
    players: &[Player],
    houses: &[House],
    use_colors: bool,
) -> String {
    if rows.is_empty() {
        return "No players to rank.".to_string();
    }

    let names: HashMap<&str, &str> = players
        .iter()
        .map(|player| (player.id.as_str(), player.full_name.as_str()))
        .collect();

    let name_width = rows
        .iter()
        .map(|row| {
            names
                .get(row.player_id.as_str())
                .copied()
                .unwrap_or(row.player_id.as_str())
                .chars()
                .count()
        })
        .max()
        .unwrap_or(0);

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let rank = idx + 1;
            let name = names
                .get(row.player_id.as_str())
                .copied()
                .unwrap_or(row.player_id.as_str());
            let name_padded = format!("{:<width$}", name, width = name_width);
            let house = house_by_id(houses, &row.house_id);
            let house_name = house.map(|h| h.name.as_str()).unwrap_or(&row.house_id);

            let rank_str = format!("{:>2}.", rank);
            let total_str = format!("{:>5}", row.total_score);
            let won_str = format!("{:>2} won", row.events_won);

            if use_colors {
                let house_colored = paint_house(house_name, house, true);
                match medal(rank) {
                    Some((r, g, b)) => format!(
                        "{} {}  {}  {} pts  {}",
                        rank_str.truecolor(r, g, b).bold(),
                        name_padded.bold(),
                        house_colored,
                        total_str.bold(),
                        won_str
                    ),
                    None => format!(
                        "{} {}  {}  {} pts  {}",
                        rank_str.dimmed(),
                        name_padded,
                        house_colored,
                        total_str,
                        won_str
                    ),
                }
            } else {
                format!(
                    "{} {}  {}  {} pts  {}",
                    rank_str, name_padded, house_name, total_str, won_str
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the event listing, one line per event:
/// "{id} {status} {name} | {category} | {kind} | {when}"
pub fn format_event_list(events: &[Event], categories: &[Category], use_colors: bool) -> String {
    if events.is_empty() {
        return "No events.".to_string();
    }

    let labels: HashMap<&str, &str> = categories
        .iter()
        .map(|category| (category.id.as_str(), category.label.as_str()))
        .collect();

    let term_width = get_terminal_width();

    events
        .iter()
        .map(|event| {
            let label = labels
                .get(event.category_id.as_str())
                .copied()
                .unwrap_or(event.category_id.as_str());
            let when = event_age(event, Utc::now());
            let status = format!("{:<11}", event.status.to_string());

            // id(4) + status(11) + the tail; the name gets whatever is left
            // on narrow terminals.
            let tail = format!(" | {} | {} | {}", label, event.kind, when);
            let name = if let Some(width) = term_width {
                let fixed = 5 + 12 + tail.chars().count();
                if width > fixed + 10 {
                    truncate_name(&event.name, width - fixed)
                } else {
                    truncate_name(&event.name, 20)
                }
            } else {
                event.name.clone()
            };

            // Pad before coloring: ANSI codes would throw the widths off.
            let id_str = format!("{:<4}", event.id);

            if use_colors {
                let status_colored = match event.status {
                    EventStatus::Scheduled => status.dimmed().to_string(),
                    EventStatus::InProgress => status.yellow().to_string(),
                    EventStatus::Completed => status.green().to_string(),
                };
                format!(
                    "{} {} {}{}",
                    id_str.dimmed(),
                    status_colored,
                    name.bold(),
                    tail.dimmed()
                )
            } else {
                format!("{} {} {}{}", id_str, status, name, tail)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single event with detailed multi-line output.
pub fn format_event_detail(
    event: &Event,
    categories: &[Category],
    players: &[Player],
    houses: &[House],
    use_colors: bool,
) -> String {
    let label = categories
        .iter()
        .find(|category| category.id == event.category_id)
        .map(|category| category.label.as_str())
        .unwrap_or(event.category_id.as_str());

    let mut lines = vec![
        if use_colors {
            event.name.bold().to_string()
        } else {
            event.name.clone()
        },
        format!("  Id: {}", event.id),
        format!("  Status: {}", event.status),
        format!("  Kind: {}", event.kind),
        format!("  Category: {}", label),
        format!("  Scoring: {}", event.scoring),
    ];

    if let Some(start) = event.start_time {
        lines.push(format!("  Started: {} ago", format_age(Utc::now() - start)));
    }
    if let Some(end) = event.end_time {
        lines.push(format!("  Finished: {} ago", format_age(Utc::now() - end)));
    }

    if let Some(results) = &event.results {
        lines.push("  Results:".to_string());
        for result in results {
            let who = resolve_participant(event.kind, &result.participant_id, players, houses)
                .map(|participant| participant.display_name().to_string())
                .unwrap_or_else(|| format!("{} (unknown)", result.participant_id));
            let points = event.scoring.points_for(result.placement).unwrap_or(0);
            lines.push(format!(
                "    {}. {} ({} pts)",
                result.placement, who, points
            ));
        }
    }

    lines.join("\n")
}

/// Format standings as tab-separated values for scripting.
/// House lines: "house\t{rank}\t{name}\t{total}\t{won}"
/// Player lines: "player\t{rank}\t{name}\t{house}\t{total}\t{won}"
/// No headers, no colors.
pub fn format_standings_tsv(
    house_rows: &[HouseScore],
    player_rows: &[PlayerScore],
    houses: &[House],
    players: &[Player],
) -> String {
    let names: HashMap<&str, &str> = players
        .iter()
        .map(|player| (player.id.as_str(), player.full_name.as_str()))
        .collect();

    let mut lines = Vec::new();
    for (idx, row) in house_rows.iter().enumerate() {
        let name = house_by_id(houses, &row.house_id)
            .map(|house| house.name.as_str())
            .unwrap_or(&row.house_id);
        lines.push(format!(
            "house\t{}\t{}\t{}\t{}",
            idx + 1,
            name,
            row.total_score,
            row.events_won
        ));
    }
    for (idx, row) in player_rows.iter().enumerate() {
        let name = names
            .get(row.player_id.as_str())
            .copied()
            .unwrap_or(row.player_id.as_str());
        let house = house_by_id(houses, &row.house_id)
            .map(|h| h.name.as_str())
            .unwrap_or(&row.house_id);
        lines.push(format!(
            "player\t{}\t{}\t{}\t{}\t{}",
            idx + 1,
            name,
            house,
            row.total_score,
            row.events_won
        ));
    }
    lines.join("\n")
}

/// Relative time for an event listing: when it started or finished.
fn event_age(event: &Event, now: DateTime<Utc>) -> String {
    match event.status {
        EventStatus::Scheduled => "not started".to_string(),
        EventStatus::InProgress => match event.start_time {
            Some(start) => format!("started {} ago", format_age(now - start)),
            None => "in progress".to_string(),
        },
        EventStatus::Completed => match event.end_time {
            Some(end) => format!("finished {} ago", format_age(now - end)),
            None => "finished".to_string(),
        },
    }
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}
