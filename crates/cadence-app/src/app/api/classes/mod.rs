//! Class-scoped routes: events, overrides, attendance, calendar and status.

mod attendance;
mod calendar;
mod events;
mod overrides;
mod status;

use salvo::Router;

use cadence_core::constants::CLASSES_ROUTE_COMPONENT;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CLASSES_ROUTE_COMPONENT).push(
        Router::with_path("{class_id}")
            .push(events::routes())
            .push(overrides::routes())
            .push(calendar::routes())
            .push(status::routes()),
    )
}
