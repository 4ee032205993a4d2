use crate::limits::*;
use crate::model::*;

use super::error::*;
use super::SchedulerError;

pub(crate) fn validate_room_id(room_id: &str) -> Result<(), SchedulerError> {
    if room_id.is_empty() {
        return Err(SchedulerError::InvalidArgument(MISSING_ARGUMENT));
    }
    if room_id.len() > MAX_ROOM_ID_LEN {
        return Err(SchedulerError::LimitExceeded("room id too long"));
    }
    Ok(())
}

/// Order first, then start-in-future, then range and width.
pub(crate) fn validate_span(start: Ms, end: Ms, now: Ms) -> Result<Span, SchedulerError> {
    let span = Span::try_new(start, end)
        .ok_or(SchedulerError::InvalidArgument(END_NOT_AFTER_START))?;
    if span.start <= now {
        return Err(SchedulerError::InvalidArgument(START_NOT_IN_FUTURE));
    }
    check_range(&span)?;
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(SchedulerError::LimitExceeded("span too wide"));
    }
    Ok(span)
}

pub(crate) fn validate_query_window(start: Ms, end: Ms) -> Result<Span, SchedulerError> {
    let span = Span::try_new(start, end)
        .ok_or(SchedulerError::InvalidArgument(END_NOT_AFTER_START))?;
    // Bounded endpoints keep `duration_ms` from overflowing.
    check_range(&span)?;
    if span.duration_ms() > MAX_QUERY_WINDOW_MS {
        return Err(SchedulerError::LimitExceeded("query window too wide"));
    }
    Ok(span)
}

fn check_range(span: &Span) -> Result<(), SchedulerError> {
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(SchedulerError::LimitExceeded("timestamp out of range"));
    }
    Ok(())
}

/// Booking ids are opaque to callers. Only an empty id is an argument
/// error; anything that isn't one of our ULIDs names no booking (`None`).
pub(crate) fn parse_booking_id(booking_id: &str) -> Result<Option<BookingId>, SchedulerError> {
    if booking_id.is_empty() {
        return Err(SchedulerError::InvalidArgument(MISSING_BOOKING_ID));
    }
    Ok(BookingId::from_string(booking_id).ok())
}
