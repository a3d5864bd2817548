use chrono::NaiveDate;
use serde::Deserialize;

use crate::emissions::CabinClass;
use crate::time::parse_date;
use crate::{CoreError, CoreResult};

/// Largest page the offers API will return.
pub const MAX_RESULTS_CAP: u32 = 250;

/// Raw query string of `GET /api/flights/search`. Everything arrives as text
/// so malformed values surface as validation errors instead of extractor
/// rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchParams {
    pub origin_location_code: Option<String>,
    pub destination_location_code: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub adults: Option<String>,
    pub travel_class: Option<String>,
    pub currency_code: Option<String>,
    pub non_stop: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchDefaults {
    pub currency: String,
    pub max_results: u32,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            max_results: MAX_RESULTS_CAP,
        }
    }
}

/// Validated flight-offers search.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSearchQuery {
    pub origin_location_code: String,
    pub destination_location_code: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
    pub travel_class: Option<CabinClass>,
    pub currency_code: String,
    pub non_stop: bool,
    pub max: u32,
}

fn required(value: Option<String>, name: &str) -> CoreResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::ValidationError(format!("{} is required", name)))
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn location_code(value: Option<String>, name: &str) -> CoreResult<String> {
    let code = required(value, name)?.to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(format!("{} must be a 3-letter IATA code", name)));
    }
    Ok(code)
}

impl FlightSearchQuery {
    pub fn from_params(params: FlightSearchParams, defaults: &SearchDefaults) -> CoreResult<Self> {
        let origin_location_code = location_code(params.origin_location_code, "originLocationCode")?;
        let destination_location_code =
            location_code(params.destination_location_code, "destinationLocationCode")?;
        let departure_date = parse_date(&required(params.departure_date, "departureDate")?)?;

        let return_date = match present(params.return_date) {
            Some(raw) => {
                let date = parse_date(&raw)?;
                if date < departure_date {
                    return Err(CoreError::ValidationError(
                        "returnDate must not be before departureDate".to_string(),
                    ));
                }
                Some(date)
            }
            None => None,
        };

        let adults = match present(params.adults) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(CoreError::ValidationError(format!("Invalid adults: {}", raw))),
            },
            None => 1,
        };

        let travel_class = present(params.travel_class)
            .map(|raw| raw.parse::<CabinClass>().map_err(CoreError::ValidationError))
            .transpose()?;

        let non_stop = match present(params.non_stop).as_deref() {
            None => false,
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| CoreError::ValidationError(format!("Invalid nonStop: {}", raw)))?,
        };

        // Values below 1 (or unreadable) fall back to the configured page size.
        let max = present(params.max)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n.min(MAX_RESULTS_CAP as i64) as u32)
            .unwrap_or_else(|| defaults.max_results.clamp(1, MAX_RESULTS_CAP));

        let currency_code = present(params.currency_code)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| defaults.currency.clone());

        Ok(Self {
            origin_location_code,
            destination_location_code,
            departure_date,
            return_date,
            adults,
            travel_class,
            currency_code,
            non_stop,
            max,
        })
    }

    pub fn is_one_way(&self) -> bool {
        self.return_date.is_none()
    }

    /// Travel class spelled the way the offers API expects it.
    pub fn travel_class_param(&self) -> Option<&'static str> {
        self.travel_class.map(|c| match c {
            CabinClass::Economy => "ECONOMY",
            CabinClass::PremiumEconomy => "PREMIUM_ECONOMY",
            CabinClass::Business => "BUSINESS",
            CabinClass::First => "FIRST",
        })
    }
}
