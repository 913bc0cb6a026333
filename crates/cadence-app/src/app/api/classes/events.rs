use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::Deserialize;
use uuid::Uuid;

use cadence_db::model::Event;
use cadence_service::schedule::events::{
    EventDraft, create_event, delete_event, reschedule_event_series,
};

use super::{attendance, overrides};
use crate::app::api::extract::{parse_body, path_id, seconds};
use crate::error::{AppResult, render_error};
use crate::store_handler::get_store_from_depot;

/// ## Summary
/// Event create / reschedule payload
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub recurrence_rule: String,
    #[serde(alias = "duration")]
    pub duration_seconds: i64,
    #[serde(default, alias = "room")]
    pub room_id: Option<Uuid>,
}

impl EventRequest {
    fn into_draft(self) -> AppResult<EventDraft> {
        Ok(EventDraft {
            recurrence_rule: self.recurrence_rule,
            duration: seconds("duration_seconds", self.duration_seconds)?,
            room_id: self.room_id,
        })
    }
}

/// ## Summary
/// POST /api/classes/{class_id}/events - Adds a recurring event to a class.
///
/// ## Side Effects
/// - Stores the event with its rule in canonical form
/// - Widens the class's start and end dates to cover the new sessions
///
/// ## Errors
/// Returns HTTP 400 for an invalid rule or duration, or a terminal class
/// Returns HTTP 404 if the class or room does not exist
/// Returns HTTP 409 with the conflict list if the room is already booked
#[handler]
async fn create_event_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match create(req, depot).await {
        Ok(event) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(event));
        }
        Err(err) => render_error(res, &err),
    }
}

async fn create(req: &mut Request, depot: &Depot) -> AppResult<Event> {
    let class_id = path_id(req, "class_id")?;
    let draft = parse_body::<EventRequest>(req).await?.into_draft()?;
    let store = get_store_from_depot(depot)?;
    Ok(store.with_transaction(|tx| create_event(tx, class_id, &draft))?)
}

/// ## Summary
/// PUT /api/classes/{class_id}/events/{event_id} - Moves the rest of a series
/// onto a new pattern.
///
/// The existing event is cut off just before the new rule's start and a new
/// event carries the series from there.
///
/// ## Errors
/// Returns HTTP 400 for an invalid rule or duration, or a terminal class
/// Returns HTTP 404 if the class or event does not exist
/// Returns HTTP 409 with the conflict list if the room is already booked
#[handler]
async fn reschedule_series_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match reschedule(req, depot).await {
        Ok(event) => res.render(Json(event)),
        Err(err) => render_error(res, &err),
    }
}

async fn reschedule(req: &mut Request, depot: &Depot) -> AppResult<Event> {
    let class_id = path_id(req, "class_id")?;
    let event_id = path_id(req, "event_id")?;
    let draft = parse_body::<EventRequest>(req).await?.into_draft()?;
    let store = get_store_from_depot(depot)?;
    Ok(store.with_transaction(|tx| reschedule_event_series(tx, class_id, event_id, &draft))?)
}

/// ## Summary
/// DELETE /api/classes/{class_id}/events/{event_id} - Removes an event and
/// its overrides.
///
/// ## Errors
/// Returns HTTP 400 for a terminal class
/// Returns HTTP 404 if the class or event does not exist
#[handler]
async fn delete_event_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match remove(req, depot) {
        Ok(_) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(err) => render_error(res, &err),
    }
}

fn remove(req: &Request, depot: &Depot) -> AppResult<Event> {
    let class_id = path_id(req, "class_id")?;
    let event_id = path_id(req, "event_id")?;
    let store = get_store_from_depot(depot)?;
    Ok(store.with_transaction(|tx| delete_event(tx, class_id, event_id))?)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("events").post(create_event_handler).push(
        Router::with_path("{event_id}")
            .put(reschedule_series_handler)
            .delete(delete_event_handler)
            .push(overrides::event_routes())
            .push(attendance::routes()),
    )
}
