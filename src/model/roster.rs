use serde::{Deserialize, Serialize};

use super::event::EventKind;

/// A team accumulating points across all events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: String,
    pub name: String,
    /// Display color in `#RRGGBB` form.
    pub color: String,
}

impl House {
    /// RGB components of the house color, for terminal tinting.
    /// `None` if the stored color is not a well-formed `#RRGGBB` string.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        parse_hex_color(&self.color)
    }
}

/// An age/group partition used to scope individual events and filtered
/// leaderboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Machine key, e.g. "kids".
    pub id: String,
    pub name: String,
    /// Display label, e.g. "Kids (under 12)".
    pub label: String,
}

/// An individual competitor. A player belongs to exactly one house and one
/// category for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub full_name: String,
    pub category_id: String,
    pub house_id: String,
}

/// A resolved result participant. Individual events place players, group
/// events place houses; the event's kind fixes which one a participant id
/// means, so the discriminant is decided once at lookup time.
#[derive(Debug, Clone, PartialEq)]
pub enum Participant<'a> {
    Player(&'a Player),
    House(&'a House),
}

impl Participant<'_> {
    pub fn display_name(&self) -> &str {
        match self {
            Participant::Player(player) => &player.full_name,
            Participant::House(house) => &house.name,
        }
    }
}

/// Resolve a result's participant id against the reference data, honoring
/// the owning event's kind. Returns `None` for dangling ids; callers decide
/// whether that is worth mentioning (aggregation skips silently, display
/// shows a placeholder).
pub fn resolve_participant<'a>(
    kind: EventKind,
    participant_id: &str,
    players: &'a [Player],
    houses: &'a [House],
) -> Option<Participant<'a>> {
    match kind {
        EventKind::Individual => players
            .iter()
            .find(|p| p.id == participant_id)
            .map(Participant::Player),
        EventKind::Group => houses
            .iter()
            .find(|h| h.id == participant_id)
            .map(Participant::House),
    }
}

/// Parse a `#RRGGBB` string into RGB components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
