use cadence_core::types::OverrideKind;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recurring meeting pattern of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub class_id: Uuid,
    #[serde(rename = "duration_seconds", with = "super::seconds")]
    pub duration: TimeDelta,
    pub room_id: Option<Uuid>,
    pub recurrence_rule: String,
}

/// ## Summary
/// An exception to its event's pattern, carrying its own rule.
///
/// Owned by exactly one event. Overrides of an event are evaluated in the
/// order they were stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub id: Uuid,
    pub event_id: Uuid,
    pub class_id: Uuid,
    pub kind: OverrideKind,
    pub override_rule: String,
    pub is_cancelled: bool,
    #[serde(default, rename = "duration_seconds", with = "super::seconds::option")]
    pub duration: Option<TimeDelta>,
    #[serde(default)]
    pub room_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<String>,
    /// For a reschedule, the cancellation and its replacement point at each other.
    #[serde(default)]
    pub linked_override_id: Option<Uuid>,
}
