pub mod config;
pub mod lifecycle;
pub mod live;
pub mod model;
pub mod output;
pub mod roster;
pub mod scoring;
pub mod standings;
pub mod store;

pub use lifecycle::{EventDraft, EventLifecycle, EventPatch, LifecycleError};
pub use model::{Category, Event, EventKind, EventResult, EventStatus, House, Player};
pub use scoring::{validate_scoring, ScoringConfig, ScoringError};
pub use standings::{aggregate, category_standings, HouseScore, PlayerScore, Standings};
pub use store::{CompetitionStore, JsonFileStore, MemoryStore, StoreError};
