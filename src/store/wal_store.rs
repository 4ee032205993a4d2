use std::io;
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::model::*;
use crate::observability::{ROOMS, WAL_FLUSH_BATCH_SIZE, WAL_FLUSH_DURATION_SECONDS};
use crate::wal::Wal;

use super::{apply_event, diff_events, sorted_rooms, RoomStore, StoreError};

/// Rooms in memory, every change appended to a write-ahead log first.
///
/// Saves are serialized on the WAL lock, so the diff taken against the
/// previous snapshot always sees the latest committed state.
pub struct WalStore {
    rooms: DashMap<RoomId, Room>,
    cancelled: DashMap<BookingId, RoomId>,
    wal: Mutex<Wal>,
}

impl WalStore {
    /// Replay the log at `path` (if any) and open it for appends.
    pub fn open(path: &Path) -> io::Result<Self> {
        let events = Wal::replay(path)?;
        let wal = Wal::open(path)?;
        let rooms = DashMap::new();
        let cancelled = DashMap::new();
        for event in &events {
            apply_event(&rooms, &cancelled, event);
        }
        info!(
            "opened {}: replayed {} events, {} rooms",
            path.display(),
            events.len(),
            rooms.len()
        );
        metrics::gauge!(ROOMS).set(rooms.len() as f64);
        Ok(Self {
            rooms,
            cancelled,
            wal: Mutex::new(wal),
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub async fn appends_since_compact(&self) -> u64 {
        self.wal.lock().await.appends_since_compact()
    }

    /// Rewrite the log with only the events needed to recreate the current
    /// state. Cancellation tombstones are kept for `was_cancelled`.
    pub async fn compact(&self) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        let mut events = Vec::new();
        for room in sorted_rooms(&self.rooms) {
            events.extend(diff_events(None, &room));
        }
        for entry in self.cancelled.iter() {
            events.push(Event::BookingCancelled {
                id: *entry.key(),
                room_id: entry.value().clone(),
            });
        }
        wal.compact(&events)
            .map_err(|e| StoreError::Wal(e.to_string()))?;
        info!("compacted {} to {} events", wal.path().display(), events.len());
        Ok(())
    }
}

#[async_trait]
impl RoomStore for WalStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<Room>, StoreError> {
        Ok(sorted_rooms(&self.rooms))
    }

    async fn save(&self, room: &Room) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        let prev = self.rooms.get(room.id()).map(|e| e.value().clone());
        let events = diff_events(prev.as_ref(), room);
        if events.is_empty() {
            return Ok(());
        }

        metrics::histogram!(WAL_FLUSH_BATCH_SIZE).record(events.len() as f64);
        let flush_start = Instant::now();
        wal.append_batch(&events)
            .map_err(|e| StoreError::Wal(e.to_string()))?;
        metrics::histogram!(WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());

        for event in &events {
            if let Event::BookingCancelled { id, room_id } = event {
                self.cancelled.insert(*id, room_id.clone());
            }
        }
        self.rooms.insert(room.id().to_string(), room.clone());
        metrics::gauge!(ROOMS).set(self.rooms.len() as f64);
        debug!("saved room {} ({} events)", room.id(), events.len());
        Ok(())
    }

    async fn was_cancelled(&self, booking_id: BookingId) -> Result<bool, StoreError> {
        Ok(self.cancelled.contains_key(&booking_id))
    }
}
