use crate::model::Booking;
use crate::store::StoreError;

pub const MISSING_ARGUMENT: &str = "booking requires a room id and valid start and end times";
pub const END_NOT_AFTER_START: &str = "end time must be after start time";
pub const START_NOT_IN_FUTURE: &str = "booking requires a start time in the future";
pub const MISSING_BOOKING_ID: &str = "cancellation requires a booking id";
pub const ALREADY_STARTED: &str = "cannot cancel a booking that has started or finished";

#[derive(Debug)]
pub enum SchedulerError {
    /// Malformed input. Nothing was read or written.
    InvalidArgument(&'static str),
    /// Well-formed request that the clock forbids right now.
    IllegalState(&'static str),
    LimitExceeded(&'static str),
    /// Persistence failed; the change was not committed.
    Store(StoreError),
    /// The change is committed but its confirmation could not be delivered.
    NotificationFailed { booking: Booking, reason: String },
}

impl From<StoreError> for SchedulerError {
    fn from(e: StoreError) -> Self {
        SchedulerError::Store(e)
    }
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            SchedulerError::IllegalState(msg) => write!(f, "illegal state: {msg}"),
            SchedulerError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            SchedulerError::Store(e) => write!(f, "store error: {e}"),
            SchedulerError::NotificationFailed { booking, reason } => write!(
                f,
                "booking {} committed but confirmation failed: {reason}",
                booking.id()
            ),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedulerError::Store(e) => Some(e),
            _ => None,
        }
    }
}
