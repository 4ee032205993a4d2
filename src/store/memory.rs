use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::*;

use super::{diff_events, sorted_rooms, RoomStore, StoreError};

/// Volatile store. Remembers cancelled booking ids for the life of the process.
pub struct InMemoryStore {
    rooms: DashMap<RoomId, Room>,
    cancelled: DashMap<BookingId, RoomId>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            cancelled: DashMap::new(),
        }
    }

    pub fn with_rooms(rooms: impl IntoIterator<Item = Room>) -> Self {
        let store = Self::new();
        for room in rooms {
            store.rooms.insert(room.id().to_string(), room);
        }
        store
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[async_trait]
impl RoomStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<Room>, StoreError> {
        Ok(sorted_rooms(&self.rooms))
    }

    async fn save(&self, room: &Room) -> Result<(), StoreError> {
        let prev = self.rooms.get(room.id()).map(|e| e.value().clone());
        for event in diff_events(prev.as_ref(), room) {
            if let Event::BookingCancelled { id, room_id } = event {
                self.cancelled.insert(id, room_id);
            }
        }
        self.rooms.insert(room.id().to_string(), room.clone());
        Ok(())
    }

    async fn was_cancelled(&self, booking_id: BookingId) -> Result<bool, StoreError> {
        Ok(self.cancelled.contains_key(&booking_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[tokio::test]
    async fn save_is_an_upsert() {
        let store = InMemoryStore::new();
        let mut room = Room::new("r1");
        store.save(&room).await.unwrap();
        store.save(&room).await.unwrap();
        assert_eq!(store.room_count(), 1);

        room.add_booking(Booking::new(Ulid::new(), "r1", Span::new(100, 200)));
        store.save(&room).await.unwrap();
        assert_eq!(store.find_by_id("r1").await.unwrap(), Some(room));
    }

    #[tokio::test]
    async fn find_all_is_sorted_by_id() {
        let store = InMemoryStore::with_rooms([Room::new("c"), Room::new("a"), Room::new("b")]);
        let ids: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn missing_room_is_none() {
        let store = InMemoryStore::new();
        assert!(store.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removed_booking_is_remembered_as_cancelled() {
        let store = InMemoryStore::new();
        let mut room = Room::new("r1");
        let b = Booking::new(Ulid::new(), "r1", Span::new(100, 200));
        room.add_booking(b.clone());
        store.save(&room).await.unwrap();
        assert!(!store.was_cancelled(b.id()).await.unwrap());

        room.remove_booking(b.id());
        store.save(&room).await.unwrap();
        assert!(store.was_cancelled(b.id()).await.unwrap());
    }
}
