mod error;
mod mutations;
mod queries;
mod validate;

pub use error::{
    SchedulerError, ALREADY_STARTED, END_NOT_AFTER_START, MISSING_ARGUMENT, MISSING_BOOKING_ID,
    START_NOT_IN_FUTURE,
};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::model::*;
use crate::notify::Notifier;
use crate::store::RoomStore;

pub type RoomLock = Arc<Mutex<()>>;

/// Decides bookings and cancellations for every room in a store.
///
/// The scheduler owns no rooms. Each operation loads what it needs from the
/// store, mutates it under that room's lock, saves it back and only then
/// notifies. Share one instance (behind an `Arc`) between all callers so the
/// per-room locks actually serialize them.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    store: Arc<dyn RoomStore>,
    notifier: Arc<dyn Notifier>,
    /// Room id → lock guarding its check-mutate-save cycle.
    room_locks: DashMap<RoomId, RoomLock>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>, store: Arc<dyn RoomStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            clock,
            store,
            notifier,
            room_locks: DashMap::new(),
        }
    }

    pub(super) fn room_lock(&self, room_id: &str) -> RoomLock {
        self.room_locks
            .entry(room_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Drop the lock entry for a room id nobody else is using.
    /// The caller must have released its own guard and clone first.
    pub(super) fn forget_room_lock(&self, room_id: &str) {
        self.room_locks
            .remove_if(room_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Id of the first room holding `booking_id`, in store order.
    pub(super) async fn locate(&self, booking_id: BookingId) -> Result<Option<RoomId>, SchedulerError> {
        let rooms = self.store.find_all().await?;
        Ok(rooms
            .into_iter()
            .find(|room| room.has_booking(booking_id))
            .map(|room| room.id().to_string()))
    }
}
