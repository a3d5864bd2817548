use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use wingman_core::masked::Masked;
use wingman_core::offer::FlightOffer;
use wingman_core::schedule::{ScheduleQuery, ScheduledFlight};
use wingman_core::search::FlightSearchQuery;
use wingman_core::supplier::{FlightOffersClient, ScheduleClient};
use wingman_core::time::parse_offset_datetime;
use wingman_core::CoreResult;

use crate::error::{read_json, ProviderError};

// Refresh the access token this long before the provider expires it.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
const SCHEDULE_PATH: &str = "/v2/schedule/flights";

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct DataResponse<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatedFlight {
    flight_designator: FlightDesignator,
    #[serde(default)]
    flight_points: Vec<FlightPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightDesignator {
    carrier_code: String,
    flight_number: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightPoint {
    iata_code: String,
    departure: Option<PointTimings>,
    arrival: Option<PointTimings>,
}

#[derive(Debug, Deserialize)]
struct PointTimings {
    #[serde(default)]
    timings: Vec<Timing>,
}

#[derive(Debug, Deserialize)]
struct Timing {
    qualifier: Option<String>,
    value: String,
}

impl PointTimings {
    /// Scheduled time (STD/STA) if tagged, otherwise the first timing.
    fn scheduled(&self, qualifier: &str) -> Option<&str> {
        self.timings
            .iter()
            .find(|t| t.qualifier.as_deref() == Some(qualifier))
            .or_else(|| self.timings.first())
            .map(|t| t.value.as_str())
    }
}

/// Map the raw dated flight onto its first boarding point and last off-point.
fn to_scheduled_flight(raw: Value) -> Result<ScheduledFlight, ProviderError> {
    let dated: DatedFlight =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let (departure_point, departure_timings) = dated
        .flight_points
        .iter()
        .find_map(|p| p.departure.as_ref().map(|d| (p, d)))
        .ok_or_else(|| ProviderError::Decode("dated flight has no departure point".to_string()))?;
    let (arrival_point, arrival_timings) = dated
        .flight_points
        .iter()
        .rev()
        .find_map(|p| p.arrival.as_ref().map(|a| (p, a)))
        .ok_or_else(|| ProviderError::Decode("dated flight has no arrival point".to_string()))?;

    let departure_value = departure_timings
        .scheduled("STD")
        .ok_or_else(|| ProviderError::Decode("missing departure timing".to_string()))?;
    let arrival_value = arrival_timings
        .scheduled("STA")
        .ok_or_else(|| ProviderError::Decode("missing arrival timing".to_string()))?;

    let flight_number = match &dated.flight_designator.flight_number {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => return Err(ProviderError::Decode(format!("unexpected flight number: {}", other))),
    };

    Ok(ScheduledFlight {
        carrier_code: dated.flight_designator.carrier_code.clone(),
        flight_number,
        departure_location: departure_point.iata_code.clone(),
        departure_at: parse_offset_datetime(departure_value)
            .map_err(|e| ProviderError::Decode(e.to_string()))?,
        arrival_location: arrival_point.iata_code.clone(),
        arrival_at: parse_offset_datetime(arrival_value)
            .map_err(|e| ProviderError::Decode(e.to_string()))?,
        raw,
    })
}

fn search_params(query: &FlightSearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("originLocationCode", query.origin_location_code.clone()),
        ("destinationLocationCode", query.destination_location_code.clone()),
        ("departureDate", query.departure_date.format("%Y-%m-%d").to_string()),
        ("adults", query.adults.to_string()),
        ("currencyCode", query.currency_code.clone()),
        ("nonStop", query.non_stop.to_string()),
        ("max", query.max.to_string()),
    ];
    if let Some(return_date) = query.return_date {
        params.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
    }
    if let Some(travel_class) = query.travel_class_param() {
        params.push(("travelClass", travel_class.to_string()));
    }
    params
}

// ============================================================================
// Client
// ============================================================================

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Amadeus Self-Service client (flight offers search and flight schedules).
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: Masked<String>,
    token: Mutex<Option<AccessToken>>,
}

impl AmadeusClient {
    pub fn new(
        base_url: &str,
        client_id: &str,
        client_secret: Masked<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, fetching a new one when the cached token
    /// is missing or about to expire.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Amadeus access token");
        let response = self
            .http
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose().as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;

        info!("Amadeus access token refreshed, valid for {}s", token.expires_in);
        let value = token.access_token.clone();
        *cached = Some(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    async fn get_data<T>(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<T>, ProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Amadeus rejected the access token, dropping it");
            self.forget_token().await;
        }

        let body: DataResponse<T> = read_json(response).await?;
        Ok(body.data)
    }
}

#[async_trait]
impl FlightOffersClient for AmadeusClient {
    async fn search_offers(&self, query: &FlightSearchQuery) -> CoreResult<Vec<FlightOffer>> {
        let offers = self.get_data(FLIGHT_OFFERS_PATH, &search_params(query)).await?;
        Ok(offers)
    }
}

#[async_trait]
impl ScheduleClient for AmadeusClient {
    async fn scheduled_flight(&self, query: &ScheduleQuery) -> CoreResult<Option<ScheduledFlight>> {
        let params = [
            ("carrierCode", query.carrier_code.clone()),
            ("flightNumber", query.flight_number.clone()),
            (
                "scheduledDepartureDate",
                query.scheduled_departure_date.format("%Y-%m-%d").to_string(),
            ),
        ];
        let flights: Vec<Value> = self.get_data(SCHEDULE_PATH, &params).await?;

        match flights.into_iter().next() {
            Some(raw) => Ok(Some(to_scheduled_flight(raw)?)),
            None => Ok(None),
        }
    }
}
