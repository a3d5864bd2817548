use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ticket::{FlightTicket, Leg};
use crate::time::parse_naive_datetime;

/// Sentinel stored when no estimate is available.
pub const UNKNOWN_EMISSIONS: i64 = -1;

/// Cabin classes the emissions model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = String;

    // Accepts both our spelling ("premium_economy") and the offers API one ("PREMIUM_ECONOMY").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(CabinClass::Economy),
            "premium_economy" | "premiumeconomy" => Ok(CabinClass::PremiumEconomy),
            "business" => Ok(CabinClass::Business),
            "first" => Ok(CabinClass::First),
            other => Err(format!("Unknown cabin class: {}", other)),
        }
    }
}

/// Per-passenger CO2 estimate in grams, one figure per cabin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsGramsPerPax {
    #[serde(default, deserialize_with = "grams")]
    pub first: Option<i64>,
    #[serde(default, deserialize_with = "grams")]
    pub business: Option<i64>,
    #[serde(default, deserialize_with = "grams")]
    pub premium_economy: Option<i64>,
    #[serde(default, deserialize_with = "grams")]
    pub economy: Option<i64>,
}

// Proto-JSON encoders may quote 64-bit integers.
fn grams<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl EmissionsGramsPerPax {
    pub fn grams_for(&self, cabin: CabinClass) -> Option<i64> {
        match cabin {
            CabinClass::Economy => self.economy,
            CabinClass::PremiumEconomy => self.premium_economy,
            CabinClass::Business => self.business,
            CabinClass::First => self.first,
        }
    }
}

/// Pick the figure for a stored cabin class string; unrecognised cabins and
/// missing figures map to [`UNKNOWN_EMISSIONS`].
pub fn estimate_for_cabin(cabin_class: &str, estimate: Option<&EmissionsGramsPerPax>) -> i64 {
    let cabin = match cabin_class.parse::<CabinClass>() {
        Ok(cabin) => cabin,
        Err(_) => return UNKNOWN_EMISSIONS,
    };
    estimate
        .and_then(|e| e.grams_for(cabin))
        .unwrap_or(UNKNOWN_EMISSIONS)
}

/// Normalize a client-supplied figure: anything not strictly positive is unknown.
pub fn normalize_emissions(value: Option<i64>) -> i64 {
    match value {
        Some(v) if v > 0 => v,
        _ => UNKNOWN_EMISSIONS,
    }
}

pub fn is_known(value: i64) -> bool {
    value > 0
}

/// One flight the emissions model is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmissionsQuery {
    pub origin: String,
    pub destination: String,
    pub operating_carrier_code: String,
    pub flight_number: String,
    pub departure_date: NaiveDate,
}

impl EmissionsQuery {
    /// Build the query for a reshaped leg. Returns `None` when the leg's
    /// departure time cannot be read.
    pub fn for_leg(leg: &Leg) -> Option<Self> {
        let departure = parse_naive_datetime(&leg.departure.time).ok()?;
        Some(Self {
            origin: leg.departure.iata_code.clone(),
            destination: leg.arrival.iata_code.clone(),
            operating_carrier_code: leg
                .operating_carrier_code
                .clone()
                .unwrap_or_else(|| leg.flight.carrier_code.clone()),
            flight_number: leg.flight.number.clone(),
            departure_date: departure.date(),
        })
    }
}

fn legs_mut(ticket: &mut FlightTicket) -> impl Iterator<Item = &mut Leg> {
    let tickets = &mut ticket.tickets;
    tickets
        .departure_ticket
        .iter_mut()
        .chain(tickets.return_ticket.iter_mut().flatten())
}

/// Distinct queries covering every leg of every ticket, in first-seen order.
pub fn emission_queries(tickets: &[FlightTicket]) -> Vec<EmissionsQuery> {
    let mut seen = std::collections::HashSet::new();
    let mut queries = Vec::new();

    for ticket in tickets {
        let legs = ticket
            .tickets
            .departure_ticket
            .iter()
            .chain(ticket.tickets.return_ticket.iter().flatten());
        for leg in legs {
            if let Some(query) = EmissionsQuery::for_leg(leg) {
                if seen.insert(query.clone()) {
                    queries.push(query);
                }
            }
        }
    }

    queries
}

/// Write each leg's emissions for its own cabin. Legs without an estimate
/// or without a recognised cabin keep [`UNKNOWN_EMISSIONS`].
pub fn apply_emissions(
    tickets: &mut [FlightTicket],
    estimates: &HashMap<EmissionsQuery, EmissionsGramsPerPax>,
) {
    for ticket in tickets.iter_mut() {
        for leg in legs_mut(ticket) {
            let estimate = EmissionsQuery::for_leg(leg).and_then(|q| estimates.get(&q));
            leg.emissions = match leg.cabin.as_deref() {
                Some(cabin) => estimate_for_cabin(cabin, estimate),
                None => UNKNOWN_EMISSIONS,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EmissionsGramsPerPax {
        EmissionsGramsPerPax {
            first: Some(3201825),
            business: Some(2561460),
            premium_economy: Some(960547),
            economy: Some(640365),
        }
    }

    #[test]
    fn test_cabin_parsing() {
        assert_eq!("ECONOMY".parse::<CabinClass>().unwrap(), CabinClass::Economy);
        assert_eq!("PREMIUM_ECONOMY".parse::<CabinClass>().unwrap(), CabinClass::PremiumEconomy);
        assert_eq!("premium_economy".parse::<CabinClass>().unwrap(), CabinClass::PremiumEconomy);
        assert!("coach".parse::<CabinClass>().is_err());
    }

    #[test]
    fn test_estimate_for_cabin() {
        let e = sample();
        assert_eq!(estimate_for_cabin("economy", Some(&e)), 640365);
        assert_eq!(estimate_for_cabin("premium_economy", Some(&e)), 960547);
        assert_eq!(estimate_for_cabin("business", Some(&e)), 2561460);
        assert_eq!(estimate_for_cabin("first", Some(&e)), 3201825);
        assert_eq!(estimate_for_cabin("coach", Some(&e)), UNKNOWN_EMISSIONS);
        assert_eq!(estimate_for_cabin("economy", None), UNKNOWN_EMISSIONS);
    }

    #[test]
    fn test_partial_estimate() {
        let e = EmissionsGramsPerPax { economy: Some(100), ..Default::default() };
        assert_eq!(estimate_for_cabin("first", Some(&e)), UNKNOWN_EMISSIONS);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_emissions(Some(110)), 110);
        assert_eq!(normalize_emissions(Some(0)), UNKNOWN_EMISSIONS);
        assert_eq!(normalize_emissions(Some(-5)), UNKNOWN_EMISSIONS);
        assert_eq!(normalize_emissions(None), UNKNOWN_EMISSIONS);
        assert!(!is_known(UNKNOWN_EMISSIONS));
    }

    fn ticket_with_legs(cabins: &[Option<&str>]) -> FlightTicket {
        use crate::ticket::{FlightDesignator, LegPoint, Tickets, TotalPrice};

        let legs = cabins
            .iter()
            .enumerate()
            .map(|(i, cabin)| Leg {
                departure: LegPoint { iata_code: "SYD".to_string(), time: format!("2023-08-0{} 10:00:00", i + 1) },
                arrival: LegPoint { iata_code: "BKK".to_string(), time: "2023-08-09 18:00:00".to_string() },
                flight: FlightDesignator { carrier_code: "TG".to_string(), number: "476".to_string() },
                flight_number: "TG 476".to_string(),
                duration: "9H10M".to_string(),
                cabin: cabin.map(str::to_string),
                emissions: UNKNOWN_EMISSIONS,
                operating_carrier_code: None,
            })
            .collect();

        FlightTicket {
            offer_type: "flight-offer".to_string(),
            one_way: true,
            origin_airport: "SYD".to_string(),
            arrival_airport: "BKK".to_string(),
            tickets: Tickets { departure_ticket: legs, return_ticket: None },
            total_departure_duration: None,
            total_return_duration: None,
            total_price: TotalPrice { total: "1.00".to_string(), currency: "USD".to_string() },
        }
    }

    #[test]
    fn test_queries_are_deduplicated() {
        let tickets = vec![ticket_with_legs(&[Some("ECONOMY")]), ticket_with_legs(&[Some("BUSINESS")])];
        let queries = emission_queries(&tickets);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].departure_date, NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());
        assert_eq!(queries[0].operating_carrier_code, "TG");
    }

    #[test]
    fn test_query_prefers_operating_carrier() {
        let mut tickets = vec![ticket_with_legs(&[Some("ECONOMY")])];
        let leg = &mut tickets[0].tickets.departure_ticket[0];
        leg.flight = crate::ticket::FlightDesignator { carrier_code: "NZ".to_string(), number: "3901".to_string() };
        leg.operating_carrier_code = Some("TG".to_string());

        let queries = emission_queries(&tickets);
        assert_eq!(queries[0].operating_carrier_code, "TG");
        assert_eq!(queries[0].flight_number, "3901");
    }

    #[test]
    fn test_apply_emissions_per_cabin() {
        let mut tickets = vec![ticket_with_legs(&[Some("BUSINESS"), None, Some("ECONOMY")])];
        let queries = emission_queries(&tickets);
        assert_eq!(queries.len(), 3);

        let mut estimates = HashMap::new();
        estimates.insert(queries[0].clone(), sample());
        estimates.insert(queries[1].clone(), sample());

        apply_emissions(&mut tickets, &estimates);
        let legs = &tickets[0].tickets.departure_ticket;
        assert_eq!(legs[0].emissions, 2561460);
        // no cabin
        assert_eq!(legs[1].emissions, UNKNOWN_EMISSIONS);
        // no estimate for the third flight
        assert_eq!(legs[2].emissions, UNKNOWN_EMISSIONS);
    }

    #[test]
    fn test_grams_deserialize_from_model_shape() {
        let json = r#"{"first": 3201825, "business": 2561460, "premiumEconomy": 960547, "economy": 640365}"#;
        let parsed: EmissionsGramsPerPax = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, sample());

        let quoted: EmissionsGramsPerPax = serde_json::from_str(r#"{"economy": "640365"}"#).unwrap();
        assert_eq!(quoted.economy, Some(640365));
        assert_eq!(quoted.first, None);
    }
}
