use salvo::http::StatusCode;
use salvo::{Depot, Response, Router, handler};

use cadence_db::error::DbError;

use crate::store_handler::get_store_from_depot;

/// ## Summary
/// GET /api/healthcheck - `OK` while the schedule store can be read.
///
/// ## Errors
/// Returns HTTP 503 if the store is missing or its lock is poisoned
#[handler]
async fn healthcheck(depot: &mut Depot, res: &mut Response) -> &'static str {
    let reachable = get_store_from_depot(depot)
        .is_ok_and(|store| store.read(|_state| Ok::<_, DbError>(())).is_ok());
    if reachable {
        "OK"
    } else {
        tracing::warn!("Healthcheck failed: schedule store unavailable");
        res.status_code(StatusCode::SERVICE_UNAVAILABLE);
        "UNAVAILABLE"
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("healthcheck").get(healthcheck)
}
