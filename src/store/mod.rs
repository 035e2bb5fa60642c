//! Persistence port and the two shipped adapters.
//!
//! The lifecycle engine and the CLI depend only on the [`CompetitionStore`]
//! trait. Unit tests inject [`MemoryStore`]; the binary wires up
//! [`JsonFileStore`], which is the same state persisted through atomic file
//! writes.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::watch;

use crate::model::{Category, Event, House, Player};

/// Current data-file format. Files claiming a newer version are refused
/// rather than guessed at.
pub const DATA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no competition data at {}; run `house-cup init` first", .path.display())]
    NotInitialized { path: PathBuf },
    #[error("competition data already exists at {}; pass --force to replace it", .path.display())]
    AlreadyInitialized { path: PathBuf },
    #[error("data file version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
    #[error("failed to read or write competition data: {0}")]
    Io(#[from] std::io::Error),
    #[error("competition data is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The whole competition snapshot as one document. Collections keep creation
/// order; standings tie-breaking relies on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CupData {
    pub version: u32,
    /// Next value for id allocation, shared across collections.
    #[serde(default = "default_next_id")]
    pub next_id: u64,
    #[serde(default)]
    pub houses: Vec<House>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub events: Vec<Event>,
}

fn default_next_id() -> u64 {
    1
}

impl Default for CupData {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            next_id: 1,
            houses: Vec::new(),
            categories: Vec::new(),
            players: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl CupData {
    /// Mint a collection-prefixed id ("h3", "e12", ...).
    pub(crate) fn alloc_id(&mut self, prefix: &str) -> String {
        let id = format!("{}{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }
}

/// Uniform id plumbing so the adapters can share collection code.
pub(crate) trait Record: Clone {
    const ID_PREFIX: &'static str;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

impl Record for House {
    const ID_PREFIX: &'static str = "h";
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Record for Category {
    const ID_PREFIX: &'static str = "c";
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Record for Player {
    const ID_PREFIX: &'static str = "p";
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Record for Event {
    const ID_PREFIX: &'static str = "e";
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Storage port for one competition instance.
///
/// `create` assigns and returns the record id; whatever id came in is
/// replaced. `update` writes the whole record under `id`, inserting it if
/// the id vanished in between — concurrent writers race at the store and the
/// last write wins. `delete` of a missing id is a no-op. Every committed
/// write bumps the revision observed through [`subscribe`].
///
/// [`subscribe`]: CompetitionStore::subscribe
pub trait CompetitionStore: Send + Sync {
    fn houses(&self) -> StoreResult<Vec<House>>;
    fn house(&self, id: &str) -> StoreResult<Option<House>>;
    fn create_house(&self, house: House) -> StoreResult<String>;
    fn update_house(&self, id: &str, house: House) -> StoreResult<()>;
    fn delete_house(&self, id: &str) -> StoreResult<()>;

    fn categories(&self) -> StoreResult<Vec<Category>>;
    fn category(&self, id: &str) -> StoreResult<Option<Category>>;
    fn create_category(&self, category: Category) -> StoreResult<String>;
    fn update_category(&self, id: &str, category: Category) -> StoreResult<()>;
    fn delete_category(&self, id: &str) -> StoreResult<()>;

    fn players(&self) -> StoreResult<Vec<Player>>;
    fn player(&self, id: &str) -> StoreResult<Option<Player>>;
    fn create_player(&self, player: Player) -> StoreResult<String>;
    fn update_player(&self, id: &str, player: Player) -> StoreResult<()>;
    fn delete_player(&self, id: &str) -> StoreResult<()>;

    fn events(&self) -> StoreResult<Vec<Event>>;
    fn event(&self, id: &str) -> StoreResult<Option<Event>>;
    fn create_event(&self, event: Event) -> StoreResult<String>;
    fn update_event(&self, id: &str, event: Event) -> StoreResult<()>;
    fn delete_event(&self, id: &str) -> StoreResult<()>;

    /// Change signal: the receiver sees a new revision after every committed
    /// write. Subscribers re-fetch the collections and recompute whatever
    /// they derive; there is no delta format.
    fn subscribe(&self) -> watch::Receiver<u64>;
}
