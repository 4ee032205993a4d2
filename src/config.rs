use std::path::PathBuf;

use tracing::{info, warn};

use crate::limits::{MAX_ROOM_ID_LEN, MAX_ROOM_NAME_LEN};
use crate::model::Room;
use crate::store::{RoomStore, StoreError};

/// Host configuration, read from `ROOMBOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    pub compact_threshold: u64,
    /// Rooms to create at startup if the store doesn't have them yet.
    pub seed_rooms: Vec<Room>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_dir: PathBuf::from(lookup("ROOMBOOK_DATA_DIR").unwrap_or_else(|| "./data".into())),
            metrics_port: lookup("ROOMBOOK_METRICS_PORT").and_then(|s| s.parse().ok()),
            compact_threshold: lookup("ROOMBOOK_COMPACT_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            seed_rooms: lookup("ROOMBOOK_ROOMS")
                .map(|s| parse_rooms(&s))
                .unwrap_or_default(),
        }
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("rooms.wal")
    }
}

/// Save every room the store doesn't hold yet. Existing rooms, and their
/// bookings, are left alone. Returns how many rooms were created.
pub async fn seed_rooms(store: &dyn RoomStore, rooms: &[Room]) -> Result<usize, StoreError> {
    let mut created = 0;
    for room in rooms {
        if room.id().is_empty()
            || room.id().len() > MAX_ROOM_ID_LEN
            || room.name().is_some_and(|n| n.len() > MAX_ROOM_NAME_LEN)
        {
            warn!("skipping seed room with oversized id or name");
            continue;
        }
        if store.find_by_id(room.id()).await?.is_none() {
            store.save(room).await?;
            info!("seeded room {}", room.id());
            created += 1;
        }
    }
    Ok(created)
}

/// `R1=Boardroom,R2` → a named room and an unnamed one.
fn parse_rooms(list: &str) -> Vec<Room> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, name)) => Room::with_name(id.trim(), name.trim()),
            None => Room::new(entry),
        })
        .collect()
}
