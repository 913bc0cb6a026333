use salvo::{Depot, Request, Response, Router, handler, writing::Json};

use cadence_rfc::rfc::recur::{Window, local_day_window, parse_timezone};
use cadence_service::schedule::calendar::{CalendarEntry, class_calendar};

use crate::app::api::extract::{path_id, query_date};
use crate::config::get_config_from_depot;
use crate::error::{AppError, AppResult, render_error};
use crate::store_handler::get_store_from_depot;

/// ## Summary
/// GET /api/classes/{class_id}/calendar?start=YYYY-MM-DD&end=YYYY-MM-DD&timezone=Zone
///
/// Lists the class's sessions from the start of `start` through the end of
/// `end`, both local to `timezone`. Without `timezone` the configured default
/// zone is used.
///
/// ## Errors
/// Returns HTTP 400 for malformed dates, `end` before `start`, or an unknown zone
/// Returns HTTP 404 if the class does not exist
#[handler]
async fn calendar_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match list(req, depot) {
        Ok(entries) => res.render(Json(entries)),
        Err(err) => render_error(res, &err),
    }
}

fn list(req: &Request, depot: &Depot) -> AppResult<Vec<CalendarEntry>> {
    let class_id = path_id(req, "class_id")?;
    let start = query_date(req, "start")?;
    let end = query_date(req, "end")?;
    if end < start {
        return Err(AppError::BadRequest(format!(
            "end {end} is before start {start}"
        )));
    }

    let zone = match req.query::<String>("timezone") {
        Some(zone) => zone,
        None => get_config_from_depot(depot)?.schedule.timezone.clone(),
    };
    let tz = parse_timezone(&zone)?;
    let window = Window::new(
        local_day_window(start, tz).start,
        local_day_window(end, tz).end,
    );

    let store = get_store_from_depot(depot)?;
    Ok(store.read(|state| class_calendar(state, class_id, &window, tz))?)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("calendar").get(calendar_handler)
}
