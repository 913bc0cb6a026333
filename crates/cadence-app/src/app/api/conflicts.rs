use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::Deserialize;
use uuid::Uuid;

use cadence_core::constants::CONFLICTS_ROUTE_COMPONENT;
use cadence_service::schedule::conflict::{ConflictCheck, RoomConflict, check_conflicts};

use super::extract::{parse_body, seconds};
use crate::error::{AppResult, render_error};
use crate::store_handler::get_store_from_depot;

/// ## Summary
/// Conflict check request payload
#[derive(Debug, Deserialize)]
pub struct ConflictCheckRequest {
    pub facility_id: Uuid,
    #[serde(alias = "room")]
    pub room_id: Uuid,
    pub recurrence_rule: String,
    #[serde(alias = "duration")]
    pub duration_seconds: i64,
    #[serde(default)]
    pub exclude_event_id: Option<Uuid>,
}

/// ## Summary
/// POST /api/conflicts - Lists the bookings a proposed schedule would overlap.
///
/// An empty list means the room is free for every proposed session.
///
/// ## Errors
/// Returns HTTP 400 for an invalid rule, duration or cross-facility room
/// Returns HTTP 404 if the room or facility does not exist
#[handler]
async fn check_conflicts_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match check(req, depot).await {
        Ok(conflicts) => res.render(Json(conflicts)),
        Err(err) => render_error(res, &err),
    }
}

async fn check(req: &mut Request, depot: &Depot) -> AppResult<Vec<RoomConflict>> {
    let body: ConflictCheckRequest = parse_body(req).await?;
    let check = ConflictCheck {
        facility_id: body.facility_id,
        room_id: body.room_id,
        recurrence_rule: body.recurrence_rule,
        duration: seconds("duration_seconds", body.duration_seconds)?,
        exclude_event_id: body.exclude_event_id,
    };

    let store = get_store_from_depot(depot)?;
    Ok(store.read(|state| check_conflicts(state, &check))?)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CONFLICTS_ROUTE_COMPONENT).post(check_conflicts_handler)
}
