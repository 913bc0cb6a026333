use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use cadence_db::model::{Event, Override};
use cadence_rfc::rfc::recur::Window;

/// ## Summary
/// One concrete session of an event.
///
/// Cancelled sessions are never represented: a resolved schedule simply
/// does not contain them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInstance {
    pub event_id: Uuid,
    pub class_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration: TimeDelta,
    pub room_id: Option<Uuid>,
    /// Set when the session comes from an override rather than the base rule.
    pub override_id: Option<Uuid>,
}

impl EventInstance {
    pub(crate) const fn from_base(event: &Event, start_time: DateTime<Utc>) -> Self {
        Self {
            event_id: event.id,
            class_id: event.class_id,
            start_time,
            duration: event.duration,
            room_id: event.room_id,
            override_id: None,
        }
    }

    pub(crate) fn from_override(
        event: &Event,
        record: &Override,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event.id,
            class_id: event.class_id,
            start_time,
            duration: record.duration.unwrap_or(event.duration),
            room_id: record.room_id.or(event.room_id),
            override_id: Some(record.id),
        }
    }

    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + self.duration
    }

    #[must_use]
    pub fn span(&self) -> Window {
        Window::new(self.start_time, self.end_time())
    }

    #[must_use]
    pub const fn is_override(&self) -> bool {
        self.override_id.is_some()
    }
}

/// A resolved session occupying a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBooking {
    pub room_id: Uuid,
    pub class_id: Uuid,
    pub event_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_override: bool,
}

impl RoomBooking {
    /// `None` when the session is not held in a room.
    #[must_use]
    pub fn from_instance(instance: &EventInstance) -> Option<Self> {
        Some(Self {
            room_id: instance.room_id?,
            class_id: instance.class_id,
            event_id: instance.event_id,
            start_time: instance.start_time,
            end_time: instance.end_time(),
            is_override: instance.is_override(),
        })
    }
}
