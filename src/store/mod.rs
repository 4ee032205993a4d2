mod memory;
mod wal_store;

pub use memory::InMemoryStore;
pub use wal_store::WalStore;

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::*;

#[derive(Debug)]
pub enum StoreError {
    Wal(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Wal(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Durable home of every room between scheduler operations.
///
/// Rooms go in and come out by value; the scheduler never holds a reference
/// into the store.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, StoreError>;

    /// Every room, in a stable enumeration order.
    async fn find_all(&self) -> Result<Vec<Room>, StoreError>;

    /// Idempotent upsert of a room and its full booking set.
    async fn save(&self, room: &Room) -> Result<(), StoreError>;

    /// Whether a booking was cancelled out of some room. Stores without
    /// history answer `false`.
    async fn was_cancelled(&self, _booking_id: BookingId) -> Result<bool, StoreError> {
        Ok(false)
    }
}

/// Events that turn `prev` into `next`. Empty when nothing changed.
pub(crate) fn diff_events(prev: Option<&Room>, next: &Room) -> Vec<Event> {
    let mut events = Vec::new();
    let before: HashSet<BookingId> = prev
        .map(|p| p.bookings().iter().map(Booking::id).collect())
        .unwrap_or_default();
    let after: HashSet<BookingId> = next.bookings().iter().map(Booking::id).collect();

    if prev.is_none() {
        events.push(Event::RoomCreated {
            id: next.id().to_string(),
            name: next.name().map(str::to_string),
        });
    }
    if let Some(prev) = prev {
        if prev.name() != next.name() {
            events.push(Event::RoomRenamed {
                id: next.id().to_string(),
                name: next.name().map(str::to_string),
            });
        }
        for b in prev.bookings() {
            if !after.contains(&b.id()) {
                events.push(Event::BookingCancelled {
                    id: b.id(),
                    room_id: next.id().to_string(),
                });
            }
        }
    }
    for b in next.bookings() {
        if !before.contains(&b.id()) {
            events.push(Event::BookingConfirmed {
                id: b.id(),
                room_id: next.id().to_string(),
                span: b.span(),
            });
        }
    }
    events
}

/// Apply a replayed event to the in-memory maps.
///
/// Replay trusts the log but not blindly: a confirmation that would break the
/// no-overlap invariant, or that names an unknown room, is skipped.
pub(crate) fn apply_event(
    rooms: &DashMap<RoomId, Room>,
    cancelled: &DashMap<BookingId, RoomId>,
    event: &Event,
) {
    match event {
        Event::RoomCreated { id, name } => {
            rooms.entry(id.clone()).or_insert_with(|| match name {
                Some(n) => Room::with_name(id.clone(), n.clone()),
                None => Room::new(id.clone()),
            });
        }
        Event::RoomRenamed { id, name } => {
            if let Some(mut room) = rooms.get_mut(id) {
                room.set_name(name.clone());
            }
        }
        Event::BookingConfirmed { id, room_id, span } => {
            if let Some(mut room) = rooms.get_mut(room_id) {
                if room.has_booking(*id) || !room.is_available(span) {
                    tracing::warn!("replay: skipping conflicting booking {id} in room {room_id}");
                    return;
                }
                room.add_booking(Booking::new(*id, room_id.clone(), *span));
            }
        }
        Event::BookingCancelled { id, room_id } => {
            if let Some(mut room) = rooms.get_mut(room_id) {
                room.remove_booking(*id);
            }
            cancelled.insert(*id, room_id.clone());
        }
    }
}

fn sorted_rooms(rooms: &DashMap<RoomId, Room>) -> Vec<Room> {
    let mut all: Vec<Room> = rooms.iter().map(|e| e.value().clone()).collect();
    all.sort_by(|a, b| a.id().cmp(b.id()));
    all
}
