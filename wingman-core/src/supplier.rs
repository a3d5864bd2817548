use async_trait::async_trait;

use crate::emissions::{EmissionsGramsPerPax, EmissionsQuery};
use crate::offer::FlightOffer;
use crate::schedule::{ScheduleQuery, ScheduledFlight};
use crate::search::FlightSearchQuery;
use crate::CoreResult;

#[async_trait]
pub trait FlightOffersClient: Send + Sync {
    /// Run a flight-offers search and return the raw offers.
    async fn search_offers(&self, query: &FlightSearchQuery) -> CoreResult<Vec<FlightOffer>>;
}

#[async_trait]
pub trait ScheduleClient: Send + Sync {
    /// Look up a dated flight. `None` when the carrier does not operate it that day.
    async fn scheduled_flight(&self, query: &ScheduleQuery) -> CoreResult<Option<ScheduledFlight>>;
}

#[async_trait]
pub trait EmissionsClient: Send + Sync {
    /// Estimate emissions for a batch of flights. The result is aligned with
    /// `queries`; `None` marks a flight the model has no estimate for.
    async fn compute_emissions(
        &self,
        queries: &[EmissionsQuery],
    ) -> CoreResult<Vec<Option<EmissionsGramsPerPax>>>;
}
