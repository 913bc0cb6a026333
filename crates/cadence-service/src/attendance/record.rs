use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use cadence_core::types::AttendanceStatus;
use cadence_db::db::ScheduleRepository;
use cadence_db::model::Attendance;

use super::tracking::apply_time_tracking;
use super::validate::validate_attendance_date;
use crate::error::{ServiceError, ServiceResult};
use crate::schedule::events::owned_event;
use crate::schedule::facility_timezone;

/// One user's attendance as submitted by an operator.
#[derive(Debug, Clone, Default)]
pub struct AttendanceEntry {
    pub user_id: Uuid,
    pub status: Option<AttendanceStatus>,
    pub reason_category: Option<String>,
    pub note: Option<String>,
    /// `HH:MM`, facility-local.
    pub check_in_at: Option<String>,
    /// `HH:MM`, facility-local.
    pub check_out_at: Option<String>,
}

/// ## Summary
/// Records attendance for a batch of users on one session date.
///
/// Each entry is checked against the resolved schedule and the user's
/// enrollment, then upserted on `(event, user, date)`. The scheduled minutes
/// come from the session itself, so a replacement duration counts. Present
/// records drop any reason and note.
///
/// ## Errors
/// Returns the first failing check from [`validate_attendance_date`] or
/// [`apply_time_tracking`]; inside a transaction nothing is written then.
#[tracing::instrument(skip(repo, entries), fields(entries = entries.len()))]
pub fn record_attendance<R>(
    repo: &mut R,
    class_id: Uuid,
    event_id: Uuid,
    date: NaiveDate,
    entries: &[AttendanceEntry],
    now: DateTime<Utc>,
) -> ServiceResult<Vec<Attendance>>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    let event = owned_event(repo, class_id, event_id)?;
    let tz = facility_timezone(repo, class.facility_id)?;

    let mut saved = Vec::with_capacity(entries.len());
    for entry in entries {
        let session = validate_attendance_date(repo, &class, &event, entry.user_id, date, tz, now)?;
        let tracked = apply_time_tracking(
            entry.status,
            entry.check_in_at.as_deref(),
            entry.check_out_at.as_deref(),
            session.duration,
        )?;

        let (reason_category, note) = if tracked.status == AttendanceStatus::Present {
            (None, None)
        } else {
            (entry.reason_category.clone(), entry.note.clone())
        };

        let record = Attendance {
            id: Uuid::new_v4(),
            event_id,
            user_id: entry.user_id,
            date,
            status: tracked.status,
            reason_category,
            note,
            check_in_at: tracked.check_in_at,
            check_out_at: tracked.check_out_at,
            minutes_attended: tracked.minutes_attended,
            scheduled_minutes: Some(tracked.scheduled_minutes),
        };
        saved.push(repo.upsert_attendance(record)?);
    }

    tracing::info!(%event_id, %date, saved = saved.len(), "Recorded attendance");
    Ok(saved)
}

/// ## Summary
/// Deletes one user's attendance for a session date, after the same date
/// and enrollment checks as recording.
///
/// ## Errors
/// Returns the errors of [`validate_attendance_date`], and `NotFound` if no
/// record exists.
#[tracing::instrument(skip(repo))]
pub fn delete_attendance<R>(
    repo: &mut R,
    class_id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> ServiceResult<()>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    let event = owned_event(repo, class_id, event_id)?;
    let tz = facility_timezone(repo, class.facility_id)?;
    validate_attendance_date(repo, &class, &event, user_id, date, tz, now)?;

    if !repo.delete_attendance(event_id, user_id, date)? {
        return Err(ServiceError::NotFound(format!(
            "attendance for user {user_id} on {date}"
        )));
    }
    tracing::info!(%event_id, %user_id, %date, "Deleted attendance");
    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
