use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

use crate::time::parse_date;
use crate::{CoreError, CoreResult};

/// Lookup of one flight number on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub carrier_code: String,
    pub flight_number: String,
    pub scheduled_departure_date: NaiveDate,
}

impl ScheduleQuery {
    pub fn new(carrier_code: &str, flight_number: &str, scheduled_departure_date: &str) -> CoreResult<Self> {
        let carrier_code = carrier_code.trim().to_ascii_uppercase();
        if carrier_code.len() < 2 || carrier_code.len() > 3 || !carrier_code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::ValidationError(format!("Invalid carrierCode: {}", carrier_code)));
        }
        let flight_number = flight_number.trim().to_string();
        if flight_number.is_empty() || flight_number.len() > 4 || !flight_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::ValidationError(format!("Invalid flightNumber: {}", flight_number)));
        }
        Ok(Self {
            carrier_code,
            flight_number,
            scheduled_departure_date: parse_date(scheduled_departure_date)?,
        })
    }
}

/// A dated flight as reported by the schedule API, reduced to its first
/// boarding point and last off-point.
#[derive(Debug, Clone)]
pub struct ScheduledFlight {
    pub carrier_code: String,
    pub flight_number: String,
    pub departure_location: String,
    /// Local departure time with the airport's UTC offset.
    pub departure_at: DateTime<FixedOffset>,
    pub arrival_location: String,
    pub arrival_at: DateTime<FixedOffset>,
    /// Provider payload, returned to the client unchanged.
    pub raw: serde_json::Value,
}

impl ScheduledFlight {
    /// Date of departure in the departure airport's local time.
    pub fn local_departure_date(&self) -> NaiveDate {
        self.departure_at.date_naive()
    }
}

/// Body of `POST /api/flights/newflight`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFlightRequest {
    #[serde(rename = "userEmail")]
    pub user_email: String,
    #[serde(rename = "carrierCode")]
    pub carrier_code: String,
    #[serde(rename = "flightNumber", deserialize_with = "crate::flight::deserialize_flight_number")]
    pub flight_number: String,
    #[serde(rename = "scheduledDepartureDate")]
    pub scheduled_departure_date: String,
    #[serde(default)]
    pub cabin_class: Option<String>,
    #[serde(default)]
    pub emissions: Option<i64>,
}

impl NewFlightRequest {
    pub fn schedule_query(&self) -> CoreResult<ScheduleQuery> {
        ScheduleQuery::new(&self.carrier_code, &self.flight_number, &self.scheduled_departure_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_query_validation() {
        let q = ScheduleQuery::new("cx", "840", "2023-07-13").unwrap();
        assert_eq!(q.carrier_code, "CX");
        assert_eq!(q.scheduled_departure_date, NaiveDate::from_ymd_opt(2023, 7, 13).unwrap());

        assert!(ScheduleQuery::new("CX", "84A", "2023-07-13").is_err());
        assert!(ScheduleQuery::new("C", "840", "2023-07-13").is_err());
        assert!(ScheduleQuery::new("CX", "840", "13/07/2023").is_err());
    }

    #[test]
    fn test_new_flight_request_accepts_numeric_flight_number() {
        let json = r#"{
            "userEmail": "user@example.com",
            "carrierCode": "CX",
            "flightNumber": 840,
            "scheduledDepartureDate": "2023-07-13",
            "emissions": 110
        }"#;
        let req: NewFlightRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.flight_number, "840");
        assert_eq!(req.cabin_class, None);
        assert_eq!(req.emissions, Some(110));
    }
}
