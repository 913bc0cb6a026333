use chrono::{NaiveDate, Utc};
use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::Deserialize;
use uuid::Uuid;

use cadence_core::types::AttendanceStatus;
use cadence_db::model::Attendance;
use cadence_service::attendance::{AttendanceEntry, delete_attendance, record_attendance};

use crate::app::api::extract::{parse_body, path_id, query_date};
use crate::error::{AppResult, render_error};
use crate::store_handler::get_store_from_depot;

/// ## Summary
/// One user's attendance in a batch
#[derive(Debug, Deserialize)]
pub struct AttendanceEntryRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub reason_category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// `HH:MM`, facility-local.
    #[serde(default)]
    pub check_in_at: Option<String>,
    /// `HH:MM`, facility-local.
    #[serde(default)]
    pub check_out_at: Option<String>,
}

impl From<AttendanceEntryRequest> for AttendanceEntry {
    fn from(entry: AttendanceEntryRequest) -> Self {
        Self {
            user_id: entry.user_id,
            status: entry.status,
            reason_category: entry.reason_category,
            note: entry.note,
            check_in_at: entry.check_in_at,
            check_out_at: entry.check_out_at,
        }
    }
}

/// ## Summary
/// Attendance batch payload for one session date
#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntryRequest>,
}

/// ## Summary
/// POST /api/classes/{class_id}/events/{event_id}/attendance - Records
/// attendance for a session date.
///
/// The batch is all-or-nothing: the first rejected entry fails the request.
///
/// ## Errors
/// Returns HTTP 400 for a future date, an unenrolled user, bad check-in
/// times, or a terminal class
/// Returns HTTP 404 if the class or event does not exist
/// Returns HTTP 409 if the date holds no session
#[handler]
async fn record_attendance_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match record(req, depot).await {
        Ok(saved) => res.render(Json(saved)),
        Err(err) => render_error(res, &err),
    }
}

async fn record(req: &mut Request, depot: &Depot) -> AppResult<Vec<Attendance>> {
    let class_id = path_id(req, "class_id")?;
    let event_id = path_id(req, "event_id")?;
    let body: AttendanceRequest = parse_body(req).await?;
    let entries: Vec<AttendanceEntry> = body.entries.into_iter().map(Into::into).collect();
    let store = get_store_from_depot(depot)?;
    let now = Utc::now();
    Ok(store.with_transaction(|tx| {
        record_attendance(tx, class_id, event_id, body.date, &entries, now)
    })?)
}

/// ## Summary
/// DELETE /api/classes/{class_id}/events/{event_id}/attendance/{user_id}?date=YYYY-MM-DD
///
/// ## Errors
/// Same checks as recording; HTTP 404 if no record exists
#[handler]
async fn delete_attendance_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match remove(req, depot) {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(err) => render_error(res, &err),
    }
}

fn remove(req: &Request, depot: &Depot) -> AppResult<()> {
    let class_id = path_id(req, "class_id")?;
    let event_id = path_id(req, "event_id")?;
    let user_id = path_id(req, "user_id")?;
    let date = query_date(req, "date")?;
    let store = get_store_from_depot(depot)?;
    let now = Utc::now();
    Ok(store.with_transaction(|tx| {
        delete_attendance(tx, class_id, event_id, user_id, date, now)
    })?)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("attendance")
        .post(record_attendance_handler)
        .push(Router::with_path("{user_id}").delete(delete_attendance_handler))
}
