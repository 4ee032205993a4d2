use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. The only time type.
pub type Ms = i64;

pub type RoomId = String;
pub type BookingId = Ulid;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Checked constructor for untrusted input.
    pub fn try_new(start: Ms, end: Ms) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Lifecycle of a booking. Never stored on the booking itself: held bookings
/// derive it from the clock, and `Cancelled` means the booking left its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Active,
    Finished,
    Cancelled,
}

/// A single reservation of one room. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    room_id: RoomId,
    span: Span,
}

impl Booking {
    pub fn new(id: BookingId, room_id: impl Into<RoomId>, span: Span) -> Self {
        Self {
            id,
            room_id: room_id.into(),
            span,
        }
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> Ms {
        self.span.start
    }

    pub fn end(&self) -> Ms {
        self.span.end
    }

    /// A booking whose start is at or before `now` can no longer be cancelled.
    pub fn has_started(&self, now: Ms) -> bool {
        self.span.start <= now
    }

    pub fn status_at(&self, now: Ms) -> BookingStatus {
        if now < self.span.start {
            BookingStatus::Pending
        } else if now < self.span.end {
            BookingStatus::Active
        } else {
            BookingStatus::Finished
        }
    }
}

/// A bookable room and the bookings it currently holds.
///
/// The room is the only authority on its own booking set. Bookings are kept
/// sorted by `span.start` and never overlap, so they are sorted by end too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    name: Option<String>,
    bookings: Vec<Booking>,
}

impl Room {
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            bookings: Vec::new(),
        }
    }

    pub fn with_name(id: impl Into<RoomId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            bookings: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    /// True iff no held booking overlaps `span`.
    pub fn is_available(&self, span: &Span) -> bool {
        self.overlapping(span).next().is_none()
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }

    /// Insert a booking at its sorted position.
    ///
    /// The caller must already have checked [`Room::is_available`]; overlap and
    /// duplicate ids are only asserted in debug builds.
    pub fn add_booking(&mut self, booking: Booking) {
        debug_assert_eq!(booking.room_id, self.id, "booking belongs to another room");
        debug_assert!(!self.has_booking(booking.id), "duplicate booking id");
        debug_assert!(self.is_available(&booking.span), "booking overlaps");
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Remove a booking by id. `None` means the room does not hold it.
    pub fn remove_booking(&mut self, id: BookingId) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    pub fn has_booking(&self, id: BookingId) -> bool {
        self.bookings.iter().any(|b| b.id == id)
    }

    pub fn get_booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }
}

/// The event types, flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: RoomId,
        name: Option<String>,
    },
    RoomRenamed {
        id: RoomId,
        name: Option<String>,
    },
    BookingConfirmed {
        id: BookingId,
        room_id: RoomId,
        span: Span,
    },
    BookingCancelled {
        id: BookingId,
        room_id: RoomId,
    },
}
