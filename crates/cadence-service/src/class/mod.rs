//! Class lifecycle.

use cadence_db::model::Class;

use crate::error::{ServiceError, ServiceResult};

pub mod status;

pub use status::transition_class_status;

/// ## Errors
/// Returns `InvalidState` if the class is completed or cancelled.
pub fn ensure_mutable(class: &Class) -> ServiceResult<()> {
    if class.status.is_terminal() {
        return Err(ServiceError::InvalidState(format!(
            "class {} is {}",
            class.id, class.status
        )));
    }
    Ok(())
}
