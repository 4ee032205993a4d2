use crate::model::Ms;

pub const MAX_ROOM_ID_LEN: usize = 256;
pub const MAX_ROOM_NAME_LEN: usize = 1024;
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;

/// 2000-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 946_684_800_000;
/// 2100-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// A single booking may not exceed one year.
pub const MAX_SPAN_DURATION_MS: Ms = 366 * 24 * 3_600_000;
/// Availability queries are capped at one year wide.
pub const MAX_QUERY_WINDOW_MS: Ms = 366 * 24 * 3_600_000;
