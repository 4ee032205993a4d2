use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::clock::Clock;
use crate::model::{Booking, BookingStatus, Ms, RoomId};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    Undeliverable(String),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Undeliverable(msg) => write!(f, "notification undeliverable: {msg}"),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Delivers booking and cancellation confirmations.
///
/// Called only after the change is persisted; a failure here never undoes it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), NotifyError>;
    async fn send_cancellation_confirmation(&self, booking: &Booking) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Confirmed,
    Cancelled,
}

/// What subscribers of the hub receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub status: BookingStatus,
    pub booking: Booking,
    pub at: Ms,
}

impl Notice {
    /// One JSON line, for hosts that forward notices elsewhere.
    pub fn to_json(&self) -> Result<String, NotifyError> {
        serde_json::to_string(self).map_err(|e| NotifyError::Undeliverable(e.to_string()))
    }
}

/// Broadcast hub for booking notices, per room plus one firehose.
pub struct NotifyHub {
    channels: DashMap<RoomId, broadcast::Sender<Notice>>,
    all: broadcast::Sender<Notice>,
    clock: Arc<dyn Clock>,
}

impl NotifyHub {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            channels: DashMap::new(),
            all: broadcast::channel(CHANNEL_CAPACITY).0,
            clock,
        }
    }

    /// Subscribe to notices for a room. Creates the channel if needed.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<Notice> {
        let sender = self
            .channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Subscribe to notices for every room.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Notice> {
        self.all.subscribe()
    }

    /// Publish a notice. No-op if nobody is listening.
    pub fn send(&self, notice: Notice) {
        if let Some(sender) = self.channels.get(notice.booking.room_id()) {
            let _ = sender.send(notice.clone());
        }
        let _ = self.all.send(notice);
    }

    fn notice(&self, kind: NoticeKind, booking: &Booking) -> Notice {
        let status = match kind {
            NoticeKind::Confirmed => BookingStatus::Pending,
            NoticeKind::Cancelled => BookingStatus::Cancelled,
        };
        Notice {
            kind,
            status,
            booking: booking.clone(),
            at: self.clock.now(),
        }
    }
}

#[async_trait]
impl Notifier for NotifyHub {
    async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), NotifyError> {
        self.send(self.notice(NoticeKind::Confirmed, booking));
        Ok(())
    }

    async fn send_cancellation_confirmation(&self, booking: &Booking) -> Result<(), NotifyError> {
        self.send(self.notice(NoticeKind::Cancelled, booking));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::Span;
    use ulid::Ulid;

    fn hub() -> NotifyHub {
        NotifyHub::new(Arc::new(ManualClock::new(500)))
    }

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = hub();
        let mut rx = hub.subscribe("r1");

        let booking = Booking::new(Ulid::new(), "r1", Span::new(1000, 2000));
        hub.send_booking_confirmation(&booking).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NoticeKind::Confirmed);
        assert_eq!(received.status, BookingStatus::Pending);
        assert_eq!(received.booking, booking);
        assert_eq!(received.at, 500);
    }

    #[tokio::test]
    async fn room_channels_are_isolated() {
        let hub = hub();
        let mut r1 = hub.subscribe("r1");
        let mut all = hub.subscribe_all();

        let booking = Booking::new(Ulid::new(), "r2", Span::new(1000, 2000));
        hub.send_cancellation_confirmation(&booking).await.unwrap();

        assert!(r1.try_recv().is_err());
        let received = all.recv().await.unwrap();
        assert_eq!(received.kind, NoticeKind::Cancelled);
        assert_eq!(received.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = hub();
        let booking = Booking::new(Ulid::new(), "r1", Span::new(1000, 2000));
        // No subscriber, should not fail
        assert!(hub.send_booking_confirmation(&booking).await.is_ok());
    }

    #[test]
    fn notice_serializes_to_json() {
        let hub = hub();
        let booking = Booking::new(Ulid::new(), "r1", Span::new(1000, 2000));
        let notice = hub.notice(NoticeKind::Confirmed, &booking);
        let json: serde_json::Value = serde_json::from_str(&notice.to_json().unwrap()).unwrap();
        assert_eq!(json["kind"], "Confirmed");
        assert_eq!(json["booking"]["room_id"], "r1");
        assert_eq!(json["booking"]["span"]["start"], 1000);
    }
}
