use std::sync::Arc;

use salvo::async_trait;

use cadence_db::db::memory::MemoryStore;

use crate::error::{AppError, AppResult};

/// Injects the shared schedule store into every request's depot.
pub struct StoreHandler {
    pub store: Arc<MemoryStore>,
}

#[async_trait]
impl salvo::Handler for StoreHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.store));
    }
}

/// ## Summary
/// Retrieves the schedule store from the depot.
///
/// ## Errors
/// Returns an error if no `StoreHandler` ran before the calling handler.
pub fn get_store_from_depot(depot: &salvo::Depot) -> AppResult<Arc<MemoryStore>> {
    depot.obtain::<Arc<MemoryStore>>().cloned().map_err(|_err| {
        AppError::CoreError(cadence_core::error::CoreError::InvariantViolation(
            "Schedule store not found in depot",
        ))
    })
}
