use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use super::{CompetitionStore, CupData, Record, StoreResult};
use crate::model::{Category, Event, House, Player};

/// In-memory adapter. The unit-test double, and the state
/// [`JsonFileStore`](super::JsonFileStore) wraps.
#[derive(Debug)]
pub struct MemoryStore {
    data: Mutex<CupData>,
    revision: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(CupData::default())
    }

    pub fn with_data(data: CupData) -> Self {
        Self {
            data: Mutex::new(data),
            revision: watch::channel(0).0,
        }
    }

    /// Clone of the whole document (the file adapter persists this).
    pub(super) fn snapshot(&self) -> CupData {
        self.lock().clone()
    }

    /// Swap in a new document wholesale. Signals subscribers only when the
    /// content actually differs; returns whether it did.
    pub(super) fn replace(&self, next: CupData) -> bool {
        {
            let mut data = self.lock();
            if *data == next {
                return false;
            }
            *data = next;
        }
        self.bump();
        true
    }

    fn lock(&self) -> MutexGuard<'_, CupData> {
        // A poisoned lock still holds a coherent document; keep serving it.
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn read<T>(&self, f: impl FnOnce(&CupData) -> T) -> T {
        f(&self.lock())
    }

    fn write<T>(&self, f: impl FnOnce(&mut CupData) -> T) -> T {
        let out = {
            let mut data = self.lock();
            f(&mut data)
        };
        self.bump();
        out
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn get<T: Record>(items: &[T], id: &str) -> Option<T> {
    items.iter().find(|record| record.id() == id).cloned()
}

fn upsert<T: Record>(items: &mut Vec<T>, record: T) {
    match items.iter_mut().find(|slot| slot.id() == record.id()) {
        Some(slot) => *slot = record,
        None => items.push(record),
    }
}

impl CompetitionStore for MemoryStore {
    fn houses(&self) -> StoreResult<Vec<House>> {
        Ok(self.read(|data| data.houses.clone()))
    }

    fn house(&self, id: &str) -> StoreResult<Option<House>> {
        Ok(self.read(|data| get(&data.houses, id)))
    }

    fn create_house(&self, mut house: House) -> StoreResult<String> {
        Ok(self.write(|data| {
            let id = data.alloc_id(House::ID_PREFIX);
            house.set_id(id.clone());
            data.houses.push(house);
            id
        }))
    }

    fn update_house(&self, id: &str, mut house: House) -> StoreResult<()> {
        house.set_id(id.to_string());
        Ok(self.write(|data| upsert(&mut data.houses, house)))
    }

    fn delete_house(&self, id: &str) -> StoreResult<()> {
        Ok(self.write(|data| data.houses.retain(|record| record.id() != id)))
    }

    fn categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read(|data| data.categories.clone()))
    }

    fn category(&self, id: &str) -> StoreResult<Option<Category>> {
        Ok(self.read(|data| get(&data.categories, id)))
    }

    fn create_category(&self, mut category: Category) -> StoreResult<String> {
        Ok(self.write(|data| {
            let id = data.alloc_id(Category::ID_PREFIX);
            category.set_id(id.clone());
            data.categories.push(category);
            id
        }))
    }

    fn update_category(&self, id: &str, mut category: Category) -> StoreResult<()> {
        category.set_id(id.to_string());
        Ok(self.write(|data| upsert(&mut data.categories, category)))
    }

    fn delete_category(&self, id: &str) -> StoreResult<()> {
        Ok(self.write(|data| data.categories.retain(|record| record.id() != id)))
    }

    fn players(&self) -> StoreResult<Vec<Player>> {
        Ok(self.read(|data| data.players.clone()))
    }

    fn player(&self, id: &str) -> StoreResult<Option<Player>> {
        Ok(self.read(|data| get(&data.players, id)))
    }

    fn create_player(&self, mut player: Player) -> StoreResult<String> {
        Ok(self.write(|data| {
            let id = data.alloc_id(Player::ID_PREFIX);
            player.set_id(id.clone());
            data.players.push(player);
            id
        }))
    }

    fn update_player(&self, id: &str, mut player: Player) -> StoreResult<()> {
        player.set_id(id.to_string());
        Ok(self.write(|data| upsert(&mut data.players, player)))
    }

    fn delete_player(&self, id: &str) -> StoreResult<()> {
        Ok(self.write(|data| data.players.retain(|record| record.id() != id)))
    }

    fn events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.read(|data| data.events.clone()))
    }

    fn event(&self, id: &str) -> StoreResult<Option<Event>> {
        Ok(self.read(|data| get(&data.events, id)))
    }

    fn create_event(&self, mut event: Event) -> StoreResult<String> {
        Ok(self.write(|data| {
            let id = data.alloc_id(Event::ID_PREFIX);
            event.set_id(id.clone());
            data.events.push(event);
            id
        }))
    }

    fn update_event(&self, id: &str, mut event: Event) -> StoreResult<()> {
        event.set_id(id.to_string());
        Ok(self.write(|data| upsert(&mut data.events, event)))
    }

    fn delete_event(&self, id: &str) -> StoreResult<()> {
        Ok(self.write(|data| data.events.retain(|record| record.id() != id)))
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
