use async_trait::async_trait;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use wingman_core::emissions::{EmissionsGramsPerPax, EmissionsQuery};
use wingman_core::masked::Masked;
use wingman_core::supplier::EmissionsClient;
use wingman_core::CoreResult;

use crate::error::{read_json, ProviderError};

const COMPUTE_EMISSIONS_PATH: &str = "/v1/flights:computeFlightEmissions";

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Serialize)]
struct ComputeRequest<'a> {
    flights: Vec<FlightPayload<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlightPayload<'a> {
    origin: &'a str,
    destination: &'a str,
    operating_carrier_code: &'a str,
    flight_number: u32,
    departure_date: DatePayload,
}

#[derive(Debug, Serialize)]
struct DatePayload {
    year: i32,
    month: u32,
    day: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeResponse {
    #[serde(default)]
    flight_emissions: Vec<FlightEmissions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightEmissions {
    emissions_grams_per_pax: Option<EmissionsGramsPerPax>,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Travel Impact Model emissions API.
pub struct TravelImpactClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Masked<String>,
}

impl TravelImpactClient {
    pub fn new(base_url: &str, api_key: Masked<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl EmissionsClient for TravelImpactClient {
    async fn compute_emissions(
        &self,
        queries: &[EmissionsQuery],
    ) -> CoreResult<Vec<Option<EmissionsGramsPerPax>>> {
        let mut results = vec![None; queries.len()];

        // The model keys flights on a numeric flight number; anything else
        // cannot have an estimate and is not sent.
        let mut sent = Vec::new();
        let mut flights = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            match query.flight_number.parse::<u32>() {
                Ok(flight_number) => {
                    sent.push(i);
                    flights.push(FlightPayload {
                        origin: &query.origin,
                        destination: &query.destination,
                        operating_carrier_code: &query.operating_carrier_code,
                        flight_number,
                        departure_date: DatePayload {
                            year: query.departure_date.year(),
                            month: query.departure_date.month(),
                            day: query.departure_date.day(),
                        },
                    });
                }
                Err(_) => warn!(
                    "Skipping emissions for {}{}: non-numeric flight number",
                    query.operating_carrier_code, query.flight_number
                ),
            }
        }

        if flights.is_empty() {
            return Ok(results);
        }

        debug!("Computing emissions for {} flights", flights.len());
        let response = self
            .http
            .post(format!("{}{}", self.base_url, COMPUTE_EMISSIONS_PATH))
            .query(&[("key", self.api_key.expose().as_str())])
            .json(&ComputeRequest { flights })
            .send()
            .await
            .map_err(ProviderError::from)?;
        let body: ComputeResponse = read_json(response).await?;

        if body.flight_emissions.len() != sent.len() {
            return Err(ProviderError::Decode(format!(
                "asked for {} flights, got {} estimates",
                sent.len(),
                body.flight_emissions.len()
            ))
            .into());
        }

        for (index, estimate) in sent.into_iter().zip(body.flight_emissions) {
            results[index] = estimate.emissions_grams_per_pax;
        }

        Ok(results)
    }
}
