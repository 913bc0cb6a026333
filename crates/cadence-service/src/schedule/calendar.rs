//! Facility-local calendar listing of a class's sessions.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use uuid::Uuid;

use cadence_db::db::ScheduleRepository;
use cadence_rfc::rfc::recur::{Window, local_date, local_time_label};

use super::resolve_stored;
use crate::error::{ServiceError, ServiceResult};

/// One session as shown on a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub event_id: Uuid,
    pub class_id: Uuid,
    pub override_id: Option<Uuid>,
    /// Local date in the requested zone.
    pub date: NaiveDate,
    /// `HH:MM-HH:MM`, local.
    pub class_time: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub room_id: Option<Uuid>,
    pub is_override: bool,
}

/// ## Summary
/// Every session of every event of a class starting in `window`, ordered
/// by start time and bucketed into local dates of `tz`.
///
/// ## Errors
/// Returns `ValidationError` for an empty window, `NotFound` for an unknown
/// class, and an error if the store cannot be read.
pub fn class_calendar<R>(
    repo: &R,
    class_id: Uuid,
    window: &Window,
    tz: Tz,
) -> ServiceResult<Vec<CalendarEntry>>
where
    R: ScheduleRepository + ?Sized,
{
    if window.is_empty() {
        return Err(ServiceError::ValidationError(
            "calendar window end must be after its start".into(),
        ));
    }
    repo.class(class_id)?;

    let mut entries = Vec::new();
    for event in repo.events_for_class(class_id)? {
        for instance in resolve_stored(repo, &event, window)? {
            let end_time = instance.end_time();
            entries.push(CalendarEntry {
                event_id: instance.event_id,
                class_id: instance.class_id,
                override_id: instance.override_id,
                date: local_date(instance.start_time, tz),
                class_time: format!(
                    "{}-{}",
                    local_time_label(instance.start_time, tz),
                    local_time_label(end_time, tz)
                ),
                start_time: instance.start_time,
                end_time,
                room_id: instance.room_id,
                is_override: instance.is_override(),
            });
        }
    }
    entries.sort_by_key(|entry| (entry.start_time, entry.event_id));

    tracing::debug!(%class_id, sessions = entries.len(), "Listed class calendar");
    Ok(entries)
}
