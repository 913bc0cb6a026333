use cadence_core::types::EnrollmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub class_id: Uuid,
    pub user_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// ## Summary
    /// Whether this enrollment is active at any point of `[start, end)`.
    ///
    /// Only `Enrolled` rows count; the enrollment span is `[enrolled_at, ended_at)`.
    #[must_use]
    pub fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status == EnrollmentStatus::Enrolled
            && self.enrolled_at < end
            && self.ended_at.is_none_or(|ended| ended > start)
    }
}
