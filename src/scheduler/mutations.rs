use std::time::Instant;

use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::limits::MAX_BOOKINGS_PER_ROOM;
use crate::model::*;
use crate::observability::*;

use super::error::*;
use super::validate::{parse_booking_id, validate_room_id, validate_span};
use super::{Scheduler, SchedulerError};

impl Scheduler {
    /// Book `room_id` for `[start, end)`.
    ///
    /// `Ok(Some(booking))` when granted, `Ok(None)` when the room is unknown
    /// or already taken for any part of the span. Arguments are validated
    /// before the store is touched.
    pub async fn book_room(
        &self,
        room_id: &str,
        start: Ms,
        end: Ms,
    ) -> Result<Option<Booking>, SchedulerError> {
        let op_start = Instant::now();
        let result = self.book_room_inner(room_id, start, end).await;
        metrics::histogram!(OPERATION_DURATION_SECONDS, "op" => "book_room")
            .record(op_start.elapsed().as_secs_f64());
        result
    }

    async fn book_room_inner(
        &self,
        room_id: &str,
        start: Ms,
        end: Ms,
    ) -> Result<Option<Booking>, SchedulerError> {
        validate_room_id(room_id)?;
        let span = validate_span(start, end, self.clock.now())?;

        let lock = self.room_lock(room_id);
        let guard = lock.lock().await;

        let Some(mut room) = self.store.find_by_id(room_id).await? else {
            drop(guard);
            drop(lock);
            self.forget_room_lock(room_id);
            debug!("book_room: no room {room_id}");
            metrics::counter!(BOOKINGS_TOTAL, "outcome" => "room_missing").increment(1);
            return Ok(None);
        };
        if room.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(SchedulerError::LimitExceeded("too many bookings in room"));
        }
        if !room.is_available(&span) {
            debug!("book_room: room {room_id} taken for [{}, {})", span.start, span.end);
            metrics::counter!(BOOKINGS_TOTAL, "outcome" => "unavailable").increment(1);
            return Ok(None);
        }

        let booking = Booking::new(Ulid::new(), room_id, span);
        room.add_booking(booking.clone());
        self.store.save(&room).await?;
        drop(guard);

        info!(
            "booked {} in room {room_id} [{}, {})",
            booking.id(),
            span.start,
            span.end
        );
        metrics::counter!(BOOKINGS_TOTAL, "outcome" => "granted").increment(1);

        if let Err(e) = self.notifier.send_booking_confirmation(&booking).await {
            warn!("booking {} committed, confirmation failed: {e}", booking.id());
            metrics::counter!(NOTIFICATION_FAILURES_TOTAL, "kind" => "booking").increment(1);
            return Err(SchedulerError::NotificationFailed {
                booking,
                reason: e.to_string(),
            });
        }
        Ok(Some(booking))
    }

    /// Cancel a booking that has not started yet.
    ///
    /// `Ok(false)` when no room holds `booking_id`. A booking whose start is
    /// at or before now is an `IllegalState` error and stays in its room.
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<bool, SchedulerError> {
        let op_start = Instant::now();
        let result = self.cancel_booking_inner(booking_id).await;
        metrics::histogram!(OPERATION_DURATION_SECONDS, "op" => "cancel_booking")
            .record(op_start.elapsed().as_secs_f64());
        result
    }

    async fn cancel_booking_inner(&self, booking_id: &str) -> Result<bool, SchedulerError> {
        let Some(id) = parse_booking_id(booking_id)? else {
            debug!("cancel_booking: {booking_id} is not a booking id");
            metrics::counter!(CANCELLATIONS_TOTAL, "outcome" => "not_found").increment(1);
            return Ok(false);
        };

        let Some(room_id) = self.locate(id).await? else {
            debug!("cancel_booking: no room holds {id}");
            metrics::counter!(CANCELLATIONS_TOTAL, "outcome" => "not_found").increment(1);
            return Ok(false);
        };

        let lock = self.room_lock(&room_id);
        let guard = lock.lock().await;

        // Reload under the lock: a concurrent cancel may have won the race.
        let Some(mut room) = self.store.find_by_id(&room_id).await? else {
            return Ok(false);
        };
        let Some(booking) = room.get_booking(id).cloned() else {
            metrics::counter!(CANCELLATIONS_TOTAL, "outcome" => "not_found").increment(1);
            return Ok(false);
        };
        if booking.has_started(self.clock.now()) {
            metrics::counter!(CANCELLATIONS_TOTAL, "outcome" => "started").increment(1);
            return Err(SchedulerError::IllegalState(ALREADY_STARTED));
        }

        room.remove_booking(id);
        self.store.save(&room).await?;
        drop(guard);

        info!("cancelled {id} in room {room_id}");
        metrics::counter!(CANCELLATIONS_TOTAL, "outcome" => "cancelled").increment(1);

        if let Err(e) = self.notifier.send_cancellation_confirmation(&booking).await {
            warn!("cancellation of {id} committed, confirmation failed: {e}");
            metrics::counter!(NOTIFICATION_FAILURES_TOTAL, "kind" => "cancellation").increment(1);
            return Err(SchedulerError::NotificationFailed {
                booking,
                reason: e.to_string(),
            });
        }
        Ok(true)
    }
}
