//! Shared competition entities: houses, categories, players, and events.

pub mod event;
pub mod roster;

pub use event::{Event, EventKind, EventResult, EventStatus};
pub use roster::{parse_hex_color, resolve_participant, Category, House, Participant, Player};
