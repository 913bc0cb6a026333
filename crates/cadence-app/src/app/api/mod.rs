mod classes;
mod conflicts;
mod extract;
mod healthcheck;

use salvo::Router;

// Re-export route constants from core
pub use cadence_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, CLASSES_ROUTE_COMPONENT, CLASSES_ROUTE_PREFIX,
    CONFLICTS_ROUTE_COMPONENT, CONFLICTS_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router with every scheduling handler.
///
/// ## Errors
/// Returns an error if any child route fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::with_path(API_ROUTE_COMPONENT)
        .push(healthcheck::routes())
        .push(conflicts::routes())
        .push(classes::routes()))
}
