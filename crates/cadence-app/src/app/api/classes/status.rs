use chrono::Utc;
use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::Deserialize;

use cadence_core::types::ClassStatus;
use cadence_db::model::Class;
use cadence_service::class::transition_class_status;

use crate::app::api::extract::{parse_body, path_id};
use crate::error::{AppResult, render_error};
use crate::store_handler::get_store_from_depot;

/// ## Summary
/// Status transition payload
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ClassStatus,
}

/// ## Summary
/// PATCH /api/classes/{class_id}/status - Moves a class to a new status.
///
/// Completing or cancelling a class ends every event's pattern at the end of
/// today, so no later sessions remain.
///
/// ## Errors
/// Returns HTTP 400 if the class is already completed or cancelled
/// Returns HTTP 404 if the class does not exist
#[handler]
async fn update_status_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match update(req, depot).await {
        Ok(class) => res.render(Json(class)),
        Err(err) => render_error(res, &err),
    }
}

async fn update(req: &mut Request, depot: &Depot) -> AppResult<Class> {
    let class_id = path_id(req, "class_id")?;
    let body: StatusRequest = parse_body(req).await?;
    let store = get_store_from_depot(depot)?;
    let now = Utc::now();
    Ok(store.with_transaction(|tx| transition_class_status(tx, class_id, body.status, now))?)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("status").patch(update_status_handler)
}
