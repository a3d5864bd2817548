use std::sync::Arc;
use wingman_core::repository::{FlightRepository, UserRepository};
use wingman_core::search::SearchDefaults;
use wingman_core::supplier::{EmissionsClient, FlightOffersClient, ScheduleClient};

#[derive(Clone)]
pub struct SearchSettings {
    pub defaults: SearchDefaults,
    pub enrich_emissions: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub flight_repo: Arc<dyn FlightRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub offers: Arc<dyn FlightOffersClient>,
    pub schedules: Arc<dyn ScheduleClient>,
    pub emissions: Arc<dyn EmissionsClient>,
    pub search: SearchSettings,
}
