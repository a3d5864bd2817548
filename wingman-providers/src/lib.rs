//! Outbound HTTP clients for the flight-data and emissions providers.

pub mod amadeus;
pub mod error;
pub mod travel_impact;

pub use amadeus::AmadeusClient;
pub use error::ProviderError;
pub use travel_impact::TravelImpactClient;
