// Application state for HTTP handlers
use crate::application::schedule_service::MaintenanceScheduleService;

#[derive(Clone)]
pub struct AppState {
    pub schedule_service: MaintenanceScheduleService,
}
