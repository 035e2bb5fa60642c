use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::debug;

use super::memory::MemoryStore;
use super::{CompetitionStore, CupData, StoreError, StoreResult, DATA_VERSION};
use crate::model::{Category, Event, House, Player};

/// File-backed adapter: an in-memory store persisted to one JSON document
/// after every mutation. Writes go through a temp file + rename, so a crash
/// never leaves a torn data file.
///
/// The in-memory copy is authoritative for the life of the process; the file
/// trails it by at most one failed write. [`reload`](Self::reload) adopts
/// outside edits (another shell running `house-cup`) on demand.
#[derive(Debug)]
pub struct JsonFileStore {
    mem: MemoryStore,
    path: PathBuf,
}

impl JsonFileStore {
    /// Open an existing data file.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(StoreError::NotInitialized { path });
        }
        let data = read_data(&path)?;
        debug!(
            "loaded {} ({} houses, {} players, {} events)",
            path.display(),
            data.houses.len(),
            data.players.len(),
            data.events.len()
        );
        Ok(Self {
            mem: MemoryStore::with_data(data),
            path,
        })
    }

    /// Create a fresh, empty data file. Refuses to clobber an existing one
    /// unless `force` is set.
    pub fn create(path: impl Into<PathBuf>, force: bool) -> StoreResult<Self> {
        let path = path.into();
        if path.exists() && !force {
            return Err(StoreError::AlreadyInitialized { path });
        }
        let data = CupData::default();
        write_data(&path, &data)?;
        Ok(Self {
            mem: MemoryStore::with_data(data),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and adopt whatever is there. Subscribers are
    /// signalled only when the content differs; returns whether it did.
    pub fn reload(&self) -> StoreResult<bool> {
        let data = read_data(&self.path)?;
        Ok(self.mem.replace(data))
    }

    fn persist(&self) -> StoreResult<()> {
        write_data(&self.path, &self.mem.snapshot())
    }
}

fn read_data(path: &Path) -> StoreResult<CupData> {
    let file = File::open(path)?;
    let data: CupData = serde_json::from_reader(file)?;
    if data.version > DATA_VERSION {
        return Err(StoreError::UnsupportedVersion(data.version));
    }
    Ok(data)
}

/// Write the document atomically, creating parent directories on first use.
fn write_data(path: &Path, data: &CupData) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = AtomicWriteFile::open(path)?;
    serde_json::to_writer_pretty(&mut file, data)?;
    file.commit()?;
    debug!("saved {}", path.display());
    Ok(())
}

impl CompetitionStore for JsonFileStore {
    fn houses(&self) -> StoreResult<Vec<House>> {
        self.mem.houses()
    }

    fn house(&self, id: &str) -> StoreResult<Option<House>> {
        self.mem.house(id)
    }

    fn create_house(&self, house: House) -> StoreResult<String> {
        let id = self.mem.create_house(house)?;
        self.persist()?;
        Ok(id)
    }

    fn update_house(&self, id: &str, house: House) -> StoreResult<()> {
        self.mem.update_house(id, house)?;
        self.persist()
    }

    fn delete_house(&self, id: &str) -> StoreResult<()> {
        self.mem.delete_house(id)?;
        self.persist()
    }

    fn categories(&self) -> StoreResult<Vec<Category>> {
        self.mem.categories()
    }

    fn category(&self, id: &str) -> StoreResult<Option<Category>> {
        self.mem.category(id)
    }

    fn create_category(&self, category: Category) -> StoreResult<String> {
        let id = self.mem.create_category(category)?;
        self.persist()?;
        Ok(id)
    }

    fn update_category(&self, id: &str, category: Category) -> StoreResult<()> {
        self.mem.update_category(id, category)?;
        self.persist()
    }

    fn delete_category(&self, id: &str) -> StoreResult<()> {
        self.mem.delete_category(id)?;
        self.persist()
    }

    fn players(&self) -> StoreResult<Vec<Player>> {
        self.mem.players()
    }

    fn player(&self, id: &str) -> StoreResult<Option<Player>> {
        self.mem.player(id)
    }

    fn create_player(&self, player: Player) -> StoreResult<String> {
        let id = self.mem.create_player(player)?;
        self.persist()?;
        Ok(id)
    }

    fn update_player(&self, id: &str, player: Player) -> StoreResult<()> {
        self.mem.update_player(id, player)?;
        self.persist()
    }

    fn delete_player(&self, id: &str) -> StoreResult<()> {
        self.mem.delete_player(id)?;
        self.persist()
    }

    fn events(&self) -> StoreResult<Vec<Event>> {
        self.mem.events()
    }

    fn event(&self, id: &str) -> StoreResult<Option<Event>> {
        self.mem.event(id)
    }

    fn create_event(&self, event: Event) -> StoreResult<String> {
        let id = self.mem.create_event(event)?;
        self.persist()?;
        Ok(id)
    }

    fn update_event(&self, id: &str, event: Event) -> StoreResult<()> {
        self.mem.update_event(id, event)?;
        self.persist()
    }

    fn delete_event(&self, id: &str) -> StoreResult<()> {
        self.mem.delete_event(id)?;
        self.persist()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.mem.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_path(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("house-cup-{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn house(name: &str) -> House {
        House {
            id: String::new(),
            name: name.to_string(),
            color: "#00AA55".to_string(),
        }
    }

    #[test]
    fn test_open_missing_file_is_not_initialized() {
        let path = scratch_path("missing");
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized { .. }));
    }

    #[test]
    fn test_create_then_reopen_round_trips() {
        let path = scratch_path("roundtrip");

        let store = JsonFileStore::create(&path, false).unwrap();
        let id = store.create_house(house("Emerald")).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        let loaded = reopened.house(&id).unwrap().unwrap();
        assert_eq!(loaded.name, "Emerald");

        // The id counter survives the round trip.
        let next = reopened.create_house(house("Crimson")).unwrap();
        assert_ne!(next, id);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_create_refuses_existing_without_force() {
        let path = scratch_path("existing");
        JsonFileStore::create(&path, false).unwrap();

        let err = JsonFileStore::create(&path, false).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInitialized { .. }));

        // --force starts over.
        let store = JsonFileStore::create(&path, true).unwrap();
        assert!(store.houses().unwrap().is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_newer_version_is_refused() {
        let path = scratch_path("version");
        let mut data = CupData::default();
        data.version = DATA_VERSION + 1;
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(v) if v == DATA_VERSION + 1));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reload_picks_up_outside_writes() {
        let path = scratch_path("reload");
        let store = JsonFileStore::create(&path, false).unwrap();
        store.create_house(house("Emerald")).unwrap();

        // Same content: no signal.
        assert!(!store.reload().unwrap());

        // Simulate another process appending a house.
        let other = JsonFileStore::open(&path).unwrap();
        other.create_house(house("Crimson")).unwrap();

        let revision = store.subscribe();
        let before = *revision.borrow();
        assert!(store.reload().unwrap());
        assert_eq!(store.houses().unwrap().len(), 2);
        assert!(*revision.borrow() > before);

        let _ = std::fs::remove_file(&path);
    }
}
