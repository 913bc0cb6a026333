use std::sync::Arc;

pub use cadence_core::config::*;
use salvo::async_trait;

use crate::error::{AppError, AppResult};

pub struct ConfigHandler {
    pub settings: Settings,
}

#[async_trait]
impl salvo::Handler for ConfigHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        let settings: Arc<Settings> = Arc::new(self.settings.clone());
        depot.inject(settings);
    }
}

/// ## Summary
/// Retrieves the application configuration from the depot.
///
/// ## Errors
/// Returns an error if the configuration is not found in the depot.
pub fn get_config_from_depot(depot: &salvo::Depot) -> AppResult<Arc<Settings>> {
    depot.obtain::<Arc<Settings>>().cloned().map_err(|_err| {
        AppError::CoreError(cadence_core::error::CoreError::InvariantViolation(
            "Configuration not found in depot",
        ))
    })
}

/// Settings for handler tests: defaults with no seed.
#[cfg(test)]
pub(crate) fn test_settings(timezone: &str) -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        logging: LoggingConfig {
            level: "debug".into(),
        },
        schedule: ScheduleConfig {
            timezone: timezone.into(),
        },
        seed: None,
    }
}

#[cfg(test)]
mod tests {
    use salvo::prelude::*;
    use salvo::test::{ResponseExt, TestClient};

    use super::*;

    #[handler]
    async fn default_zone(depot: &mut Depot) -> String {
        get_config_from_depot(depot)
            .map(|settings| settings.schedule.timezone.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn settings_reach_handlers() {
        let router = Router::new()
            .hoop(ConfigHandler {
                settings: test_settings("America/Chicago"),
            })
            .push(Router::with_path("zone").get(default_zone));

        let body = TestClient::get("http://127.0.0.1:5800/zone")
            .send(router)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(body, "America/Chicago");
    }

    #[test]
    fn missing_settings_is_an_invariant_violation() {
        let depot = Depot::new();
        assert!(matches!(
            get_config_from_depot(&depot),
            Err(AppError::CoreError(_))
        ));
    }
}
