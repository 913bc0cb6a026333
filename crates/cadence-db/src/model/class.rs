use cadence_core::types::ClassStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ## Summary
/// A class owning one or more recurring events.
///
/// `start_dt` and `end_dt` are derived from the events' resolved sessions;
/// `end_dt` is `None` until a bounded series or a session end is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub name: String,
    pub status: ClassStatus,
    pub start_dt: DateTime<Utc>,
    pub end_dt: Option<DateTime<Utc>>,
}
