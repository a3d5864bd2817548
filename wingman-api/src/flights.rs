use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

use wingman_core::emissions::{apply_emissions, emission_queries, estimate_for_cabin};
use wingman_core::flight::{FlightKey, FlightRecord, NewFlight};
use wingman_core::schedule::NewFlightRequest;
use wingman_core::search::{FlightSearchParams, FlightSearchQuery};
use wingman_core::supplier::EmissionsClient;
use wingman_core::ticket::{flights_filter, FlightTicket};
use wingman_core::{CoreError, CoreResult};

use crate::error::{json_rejection, query_rejection, repository_error, AppError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights", get(list_user_flights))
        .route("/api/flights/search", get(search_flights))
        .route("/api/flights/flight", delete(delete_flight))
        .route("/api/flights/newflight", post(create_flight))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UserFlightsParams {
    pub id: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/flights?id=<user id>
/// Every flight saved by the user
pub async fn list_user_flights(
    State(state): State<AppState>,
    params: Result<Query<UserFlightsParams>, QueryRejection>,
) -> Result<Json<Vec<FlightRecord>>, AppError> {
    let Query(params) = params.map_err(query_rejection)?;
    let raw_id = params
        .id
        .ok_or_else(|| AppError::ValidationError("id is required".to_string()))?;
    let user_id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| AppError::ValidationError(format!("Invalid user id: {}", raw_id)))?;

    let flights = state.flight_repo.list_for_user(user_id).await.map_err(repository_error)?;
    Ok(Json(flights))
}

/// GET /api/flights/search
/// Search offers and reshape them into tickets
pub async fn search_flights(
    State(state): State<AppState>,
    params: Result<Query<FlightSearchParams>, QueryRejection>,
) -> Result<Json<Vec<FlightTicket>>, AppError> {
    let started = Instant::now();
    let Query(params) = params.map_err(query_rejection)?;
    let query = FlightSearchQuery::from_params(params, &state.search.defaults)?;

    let offers = state.offers.search_offers(&query).await?;
    let mut tickets = flights_filter(
        &query.origin_location_code,
        &query.destination_location_code,
        query.is_one_way(),
        &offers,
    );

    if state.search.enrich_emissions {
        enrich_with_emissions(state.emissions.as_ref(), &mut tickets).await;
    }

    info!(
        offers = offers.len(),
        tickets = tickets.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Search {} -> {} on {}",
        query.origin_location_code,
        query.destination_location_code,
        query.departure_date
    );

    Ok(Json(tickets))
}

/// DELETE /api/flights/flight
/// Remove the user's matching flights; succeeds even when nothing matched
pub async fn delete_flight(
    State(state): State<AppState>,
    body: Result<Json<FlightKey>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(key) = body.map_err(json_rejection)?;
    let deleted = state.flight_repo.delete_matching(&key).await.map_err(repository_error)?;

    Ok(Json(json!({
        "message": "delete ok",
        "deleted": deleted,
    })))
}

/// POST /api/flights/newflight
/// Look up the dated flight, fill in emissions, save it for the user
pub async fn create_flight(
    State(state): State<AppState>,
    body: Result<Json<NewFlightRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = body.map_err(json_rejection)?;
    let schedule_query = req.schedule_query()?;

    // 1. Resolve the owner
    let user = state
        .user_repo
        .find_by_email(&req.user_email)
        .await
        .map_err(repository_error)?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    // 2. Dated flight from the schedule API
    let scheduled = state
        .schedules
        .scheduled_flight(&schedule_query)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundError(format!(
                "No scheduled flight {}{} on {}",
                schedule_query.carrier_code,
                schedule_query.flight_number,
                schedule_query.scheduled_departure_date
            ))
        })?;

    // 3. Emissions, unless the client already knows them
    let mut flight = NewFlight::from_schedule(&scheduled, req.cabin_class.as_deref(), req.emissions);
    fill_emissions(state.emissions.as_ref(), &mut flight).await?;

    // 4. Persist
    let record = state
        .flight_repo
        .insert(user.id, &flight)
        .await
        .map_err(repository_error)?;
    info!(
        flight_id = record.id,
        emissions = record.emissions,
        "User {} saved {} {}",
        user.id,
        record.carrier_code,
        record.flight_number
    );

    Ok(Json(scheduled.raw))
}

// ============================================================================
// Emissions helpers
// ============================================================================

/// Fetch the estimate for a flight whose emissions are still unknown.
pub async fn fill_emissions(client: &dyn EmissionsClient, flight: &mut NewFlight) -> CoreResult<()> {
    if flight.emissions_known() {
        return Ok(());
    }

    let results = client.compute_emissions(&[flight.emissions_query()]).await?;
    let estimate = results.into_iter().next().ok_or_else(|| {
        CoreError::UpstreamError("emissions model returned no result".to_string())
    })?;
    flight.emissions = estimate_for_cabin(&flight.cabin_class, estimate.as_ref());
    Ok(())
}

/// Best-effort: a failing emissions model leaves every leg unknown.
async fn enrich_with_emissions(client: &dyn EmissionsClient, tickets: &mut [FlightTicket]) {
    let queries = emission_queries(tickets);
    if queries.is_empty() {
        return;
    }

    match client.compute_emissions(&queries).await {
        Ok(results) => {
            let estimates: HashMap<_, _> = queries
                .into_iter()
                .zip(results)
                .filter_map(|(query, estimate)| estimate.map(|e| (query, e)))
                .collect();
            apply_emissions(tickets, &estimates);
        }
        Err(e) => warn!("Emissions enrichment skipped: {}", e),
    }
}
