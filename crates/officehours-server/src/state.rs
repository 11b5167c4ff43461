use std::sync::Arc;

use officehours_adapters::persistence::sqlite::SqliteDb;
use officehours_app::error::AppError;
use officehours_app::office_hour_service::OfficeHourService;
use officehours_app::registration_service::RegistrationService;
use officehours_ports::inbound::{OfficeHourManager, RegistrationManager};

/// Shared by every handler. Services are behind trait objects so routes can
/// be exercised against any implementation.
#[derive(Clone)]
pub struct AppState {
    pub office_hours: Arc<dyn OfficeHourManager<Error = AppError>>,
    pub registrations: Arc<dyn RegistrationManager<Error = AppError>>,
}

impl AppState {
    pub fn sqlite(db: SqliteDb) -> Self {
        Self {
            office_hours: Arc::new(OfficeHourService::new(db.clone(), db.clone(), db.clone())),
            registrations: Arc::new(RegistrationService::new(db.clone(), db.clone(), db)),
        }
    }
}
