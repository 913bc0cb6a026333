use cadence_core::types::AttendanceStatus;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ## Summary
/// Attendance of one user at one session date. Unique on
/// `(event_id, user_id, date)`; `date` is the facility-local calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub reason_category: Option<String>,
    pub note: Option<String>,
    pub check_in_at: Option<NaiveTime>,
    pub check_out_at: Option<NaiveTime>,
    pub minutes_attended: Option<i64>,
    pub scheduled_minutes: Option<i64>,
}

impl Attendance {
    #[must_use]
    pub const fn key(&self) -> (Uuid, Uuid, NaiveDate) {
        (self.event_id, self.user_id, self.date)
    }
}
