use std::time::Instant;

use crate::model::*;
use crate::observability::OPERATION_DURATION_SECONDS;

use super::validate::{parse_booking_id, validate_query_window};
use super::{Scheduler, SchedulerError};

impl Scheduler {
    /// Snapshots of every room free for all of `[start, end)`, in store order.
    pub async fn get_available_rooms(&self, start: Ms, end: Ms) -> Result<Vec<Room>, SchedulerError> {
        let op_start = Instant::now();
        let span = validate_query_window(start, end)?;
        let mut rooms = self.store.find_all().await?;
        rooms.retain(|room| room.is_available(&span));
        metrics::histogram!(OPERATION_DURATION_SECONDS, "op" => "get_available_rooms")
            .record(op_start.elapsed().as_secs_f64());
        Ok(rooms)
    }

    pub async fn find_booking(&self, booking_id: &str) -> Result<Option<Booking>, SchedulerError> {
        let Some(id) = parse_booking_id(booking_id)? else {
            return Ok(None);
        };
        let rooms = self.store.find_all().await?;
        Ok(rooms
            .iter()
            .find_map(|room| room.get_booking(id).cloned()))
    }

    /// Status of a booking right now. `None` if no room holds it and the
    /// store has no record of it being cancelled.
    pub async fn booking_status(&self, booking_id: &str) -> Result<Option<BookingStatus>, SchedulerError> {
        let Some(id) = parse_booking_id(booking_id)? else {
            return Ok(None);
        };
        if let Some(booking) = self.find_booking(booking_id).await? {
            return Ok(Some(booking.status_at(self.clock.now())));
        }
        if self.store.was_cancelled(id).await? {
            return Ok(Some(BookingStatus::Cancelled));
        }
        Ok(None)
    }
}
