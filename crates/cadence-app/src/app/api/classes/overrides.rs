use chrono::{DateTime, NaiveDate, Utc};
use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::types::OverrideKind;
use cadence_db::model::Override;
use cadence_service::schedule::overrides::{
    NewOverride, OverrideRuleSpec, SessionMove, create_override, delete_override,
    reschedule_session,
};

use crate::app::api::extract::{optional_seconds, parse_body, path_id};
use crate::error::{AppResult, render_error};
use crate::store_handler::get_store_from_depot;

/// ## Summary
/// Override create payload.
///
/// `override_rule` may be given verbatim; when omitted the rule is built from
/// `kind` and `date` (and `until` for forward overrides) against the parent
/// event's pattern.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub kind: OverrideKind,
    #[serde(default)]
    pub override_rule: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default, alias = "duration")]
    pub duration_seconds: Option<i64>,
    #[serde(default, alias = "room")]
    pub room_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub linked_override_id: Option<Uuid>,
}

impl OverrideRequest {
    fn into_new_override(self) -> AppResult<NewOverride> {
        let rule = match self.override_rule {
            Some(text) => OverrideRuleSpec::Text(text),
            None => OverrideRuleSpec::Built {
                date: self.date,
                until: self.until,
            },
        };
        Ok(NewOverride {
            kind: self.kind,
            rule,
            is_cancelled: self.is_cancelled,
            duration: optional_seconds("duration_seconds", self.duration_seconds)?,
            room_id: self.room_id,
            reason: self.reason,
            linked_override_id: self.linked_override_id,
        })
    }
}

/// ## Summary
/// Single-session move payload
#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    /// Facility-local date of the session being moved.
    pub date: NaiveDate,
    pub new_start: DateTime<Utc>,
    #[serde(default, alias = "duration")]
    pub duration_seconds: Option<i64>,
    #[serde(default, alias = "room")]
    pub room_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// ## Summary
/// The two linked overrides a session move creates.
#[derive(Debug, Serialize)]
pub struct RescheduleResponse {
    pub cancellation: Override,
    pub replacement: Override,
}

/// ## Summary
/// POST /api/classes/{class_id}/events/{event_id}/overrides - Records an
/// exception to an event's pattern.
///
/// ## Side Effects
/// - Attendance on dates that no longer have a session is deleted
/// - The class's dates are widened if the override adds later sessions
///
/// ## Errors
/// Returns HTTP 400 for an invalid rule, a rule that does not match `kind`,
/// or a terminal class
/// Returns HTTP 404 if the class or event does not exist
/// Returns HTTP 409 with the conflict list if the replacement room is booked
#[handler]
async fn create_override_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match create(req, depot).await {
        Ok(record) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(record));
        }
        Err(err) => render_error(res, &err),
    }
}

async fn create(req: &mut Request, depot: &Depot) -> AppResult<Override> {
    let class_id = path_id(req, "class_id")?;
    let event_id = path_id(req, "event_id")?;
    let request = parse_body::<OverrideRequest>(req).await?.into_new_override()?;
    let store = get_store_from_depot(depot)?;
    let now = Utc::now();
    Ok(store.with_transaction(|tx| create_override(tx, class_id, event_id, &request, now))?)
}

/// ## Summary
/// POST /api/classes/{class_id}/events/{event_id}/reschedule - Moves one
/// session to a new start, duration or room.
///
/// ## Errors
/// Returns HTTP 400 for a terminal class or an invalid duration
/// Returns HTTP 404 if the class or event does not exist
/// Returns HTTP 409 with the conflict list if the new slot's room is booked
#[handler]
async fn reschedule_session_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match reschedule(req, depot).await {
        Ok((cancellation, replacement)) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(RescheduleResponse {
                cancellation,
                replacement,
            }));
        }
        Err(err) => render_error(res, &err),
    }
}

async fn reschedule(req: &mut Request, depot: &Depot) -> AppResult<(Override, Override)> {
    let class_id = path_id(req, "class_id")?;
    let event_id = path_id(req, "event_id")?;
    let body: RescheduleRequest = parse_body(req).await?;
    let change = SessionMove {
        date: body.date,
        new_start: body.new_start,
        duration: optional_seconds("duration_seconds", body.duration_seconds)?,
        room_id: body.room_id,
        reason: body.reason,
    };
    let store = get_store_from_depot(depot)?;
    let now = Utc::now();
    Ok(store.with_transaction(|tx| reschedule_session(tx, class_id, event_id, &change, now))?)
}

/// ## Summary
/// DELETE /api/classes/{class_id}/overrides/{override_id} - Restores the
/// sessions an override changed.
///
/// Deleting one half of a moved session deletes its linked half too. The
/// response lists every override removed.
///
/// ## Errors
/// Returns HTTP 400 for a terminal class
/// Returns HTTP 404 if the class or override does not exist
#[handler]
async fn delete_override_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match remove(req, depot) {
        Ok(removed) => res.render(Json(removed)),
        Err(err) => render_error(res, &err),
    }
}

fn remove(req: &Request, depot: &Depot) -> AppResult<Vec<Override>> {
    let class_id = path_id(req, "class_id")?;
    let override_id = path_id(req, "override_id")?;
    let store = get_store_from_depot(depot)?;
    Ok(store.with_transaction(|tx| delete_override(tx, class_id, override_id))?)
}

/// Routes below `/events/{event_id}`.
#[must_use]
pub fn event_routes() -> Router {
    Router::new()
        .push(Router::with_path("overrides").post(create_override_handler))
        .push(Router::with_path("reschedule").post(reschedule_session_handler))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("overrides/{override_id}").delete(delete_override_handler)
}
