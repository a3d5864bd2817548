use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::emissions::{is_known, normalize_emissions, EmissionsQuery};
use crate::schedule::ScheduledFlight;
use crate::time::deserialize_utc_datetime;

pub const DEFAULT_CABIN_CLASS: &str = "economy";

/// A flight saved by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub carrier_code: String,
    pub flight_number: String,
    pub departure_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_date: DateTime<Utc>,
    pub arrival_location: String,
    pub cabin_class: String,
    pub emissions: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Row about to be inserted. The emissions figure may still be unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlight {
    pub carrier_code: String,
    pub flight_number: String,
    pub departure_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_date: DateTime<Utc>,
    pub arrival_location: String,
    pub cabin_class: String,
    pub emissions: i64,
    departure_local_date: chrono::NaiveDate,
}

impl NewFlight {
    pub fn from_schedule(scheduled: &ScheduledFlight, cabin_class: Option<&str>, emissions: Option<i64>) -> Self {
        let cabin_class = cabin_class
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CABIN_CLASS)
            .to_ascii_lowercase();

        Self {
            carrier_code: scheduled.carrier_code.clone(),
            flight_number: scheduled.flight_number.clone(),
            departure_date: scheduled.departure_at.with_timezone(&Utc),
            departure_location: scheduled.departure_location.clone(),
            arrival_date: scheduled.arrival_at.with_timezone(&Utc),
            arrival_location: scheduled.arrival_location.clone(),
            cabin_class,
            emissions: normalize_emissions(emissions),
            departure_local_date: scheduled.local_departure_date(),
        }
    }

    pub fn emissions_known(&self) -> bool {
        is_known(self.emissions)
    }

    /// The emissions model is keyed on the local departure date.
    pub fn emissions_query(&self) -> EmissionsQuery {
        EmissionsQuery {
            origin: self.departure_location.clone(),
            destination: self.arrival_location.clone(),
            operating_carrier_code: self.carrier_code.clone(),
            flight_number: self.flight_number.clone(),
            departure_date: self.departure_local_date,
        }
    }
}

/// Predicate of `DELETE /api/flights/flight`; every field must match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlightKey {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub carrier_code: String,
    #[serde(deserialize_with = "deserialize_flight_number")]
    pub flight_number: String,
    #[serde(deserialize_with = "deserialize_utc_datetime")]
    pub departure_date: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_utc_datetime")]
    pub arrival_date: DateTime<Utc>,
}

/// Clients send flight numbers both as `"830"` and `830`.
pub fn deserialize_flight_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => Ok(s.trim().to_string()),
        Raw::Number(n) => Ok(n.to_string()),
    }
}
