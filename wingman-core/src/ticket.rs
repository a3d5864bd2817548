use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emissions::UNKNOWN_EMISSIONS;
use crate::offer::{FareDetails, FlightOffer, Segment};

// ============================================================================
// Ticket representation returned by the search route
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightTicket {
    #[serde(rename = "type")]
    pub offer_type: String,
    #[serde(rename = "oneWay")]
    pub one_way: bool,
    pub origin_airport: String,
    pub arrival_airport: String,
    pub tickets: Tickets,
    pub total_departure_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_return_duration: Option<String>,
    pub total_price: TotalPrice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tickets {
    pub departure_ticket: Vec<Leg>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_ticket: Option<Vec<Leg>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalPrice {
    pub total: String,
    pub currency: String,
}

/// One flattened itinerary segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub departure: LegPoint,
    pub arrival: LegPoint,
    pub flight: FlightDesignator,
    pub flight_number: String,
    pub duration: String,
    pub cabin: Option<String>,
    pub emissions: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_carrier_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegPoint {
    #[serde(rename = "iataCode")]
    pub iata_code: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDesignator {
    #[serde(rename = "carrierCode")]
    pub carrier_code: String,
    pub number: String,
}

// ============================================================================
// Reshaping
// ============================================================================

/// Normalize raw flight offers into tickets.
///
/// Only offers whose outbound itinerary really starts at `origin` and ends at
/// `destination` are kept; the provider also returns offers that use another
/// airport of the same city. For round trips the second itinerary becomes the
/// return ticket.
pub fn flights_filter(
    origin: &str,
    destination: &str,
    one_way: bool,
    offers: &[FlightOffer],
) -> Vec<FlightTicket> {
    let mut tickets = Vec::new();

    for offer in offers {
        let outbound = match offer.itineraries.first() {
            Some(itinerary) if !itinerary.segments.is_empty() => itinerary,
            _ => continue,
        };
        let segments = &outbound.segments;
        let origin_airport = &segments[0].departure.iata_code;
        let final_airport = &segments[segments.len() - 1].arrival.iata_code;

        if origin_airport != origin || final_airport != destination {
            debug!(
                offer_id = ?offer.id,
                "Dropping offer {} -> {} for search {} -> {}",
                origin_airport, final_airport, origin, destination
            );
            continue;
        }

        let fare_details = offer
            .traveler_pricings
            .first()
            .map(|p| p.fare_details_by_segment.as_slice())
            .unwrap_or(&[]);

        let mut departure_ticket = segments_filter(segments);
        attach_cabins(&mut departure_ticket, segments, fare_details, 0);

        let mut return_ticket = None;
        let mut total_return_duration = None;
        if !one_way {
            if let Some(inbound) = offer.itineraries.get(1) {
                let mut legs = segments_filter(&inbound.segments);
                attach_cabins(&mut legs, &inbound.segments, fare_details, segments.len());
                return_ticket = Some(legs);
                total_return_duration = inbound.duration.clone();
            }
        }

        tickets.push(FlightTicket {
            offer_type: offer.offer_type.clone(),
            one_way,
            origin_airport: origin_airport.clone(),
            arrival_airport: final_airport.clone(),
            tickets: Tickets {
                departure_ticket,
                return_ticket,
            },
            total_departure_duration: outbound.duration.clone(),
            total_return_duration,
            total_price: TotalPrice {
                total: offer.price.total.clone(),
                currency: offer.price.currency.clone(),
            },
        });
    }

    tickets
}

/// Flatten segments into legs. Cabin and emissions are filled in later.
pub fn segments_filter(segments: &[Segment]) -> Vec<Leg> {
    segments
        .iter()
        .map(|segment| Leg {
            departure: LegPoint {
                iata_code: segment.departure.iata_code.clone(),
                time: segment.departure.at.replace('T', " "),
            },
            arrival: LegPoint {
                iata_code: segment.arrival.iata_code.clone(),
                time: segment.arrival.at.replace('T', " "),
            },
            flight: FlightDesignator {
                carrier_code: segment.carrier_code.clone(),
                number: segment.number.clone(),
            },
            flight_number: format!("{} {}", segment.carrier_code, segment.number),
            duration: trim_duration(segment.duration.as_deref().unwrap_or_default()),
            cabin: None,
            emissions: UNKNOWN_EMISSIONS,
            operating_carrier_code: segment
                .operating
                .as_ref()
                .and_then(|op| op.carrier_code.clone())
                .filter(|code| *code != segment.carrier_code),
        })
        .collect()
}

/// "PT2H35M" -> "2H35M"
fn trim_duration(duration: &str) -> String {
    duration.strip_prefix("PT").unwrap_or(duration).to_string()
}

// Fare details are listed for all itineraries in order; `offset` is the
// position of the first segment of this itinerary in that list.
fn attach_cabins(legs: &mut [Leg], segments: &[Segment], details: &[FareDetails], offset: usize) {
    for (i, (leg, segment)) in legs.iter_mut().zip(segments).enumerate() {
        let by_id = segment.id.as_deref().and_then(|id| {
            details
                .iter()
                .find(|d| d.segment_id.as_deref() == Some(id))
        });
        leg.cabin = by_id
            .or_else(|| details.get(offset + i))
            .and_then(|d| d.cabin.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{Itinerary, OfferPrice, SegmentPoint, TravelerPricing};

    fn segment(id: &str, from: &str, to: &str, dep: &str, arr: &str, carrier: &str, number: &str) -> Segment {
        Segment {
            id: Some(id.to_string()),
            departure: SegmentPoint { iata_code: from.to_string(), at: dep.to_string() },
            arrival: SegmentPoint { iata_code: to.to_string(), at: arr.to_string() },
            carrier_code: carrier.to_string(),
            number: number.to_string(),
            duration: Some("PT3H5M".to_string()),
            operating: None,
        }
    }

    fn fare(segment_id: Option<&str>, cabin: &str) -> FareDetails {
        FareDetails {
            segment_id: segment_id.map(str::to_string),
            cabin: Some(cabin.to_string()),
        }
    }

    fn offer(itineraries: Vec<Vec<Segment>>, details: Vec<FareDetails>) -> FlightOffer {
        FlightOffer {
            offer_type: "flight-offer".to_string(),
            id: Some("1".to_string()),
            itineraries: itineraries
                .into_iter()
                .map(|segments| Itinerary { duration: Some("PT12H".to_string()), segments })
                .collect(),
            price: OfferPrice { total: "812.40".to_string(), currency: "USD".to_string() },
            traveler_pricings: vec![TravelerPricing { fare_details_by_segment: details }],
        }
    }

    #[test]
    fn test_one_way_connection() {
        let offers = vec![offer(
            vec![vec![
                segment("1", "SYD", "MNL", "2023-08-02T10:00:00", "2023-08-02T16:00:00", "PR", "212"),
                segment("2", "MNL", "BKK", "2023-08-02T18:00:00", "2023-08-02T20:35:00", "PR", "732"),
            ]],
            vec![fare(Some("1"), "ECONOMY"), fare(Some("2"), "BUSINESS")],
        )];

        let tickets = flights_filter("SYD", "BKK", true, &offers);
        assert_eq!(tickets.len(), 1);

        let t = &tickets[0];
        assert!(t.one_way);
        assert_eq!(t.origin_airport, "SYD");
        assert_eq!(t.arrival_airport, "BKK");
        assert!(t.tickets.return_ticket.is_none());
        assert!(t.total_return_duration.is_none());

        let legs = &t.tickets.departure_ticket;
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].departure.time, "2023-08-02 10:00:00");
        assert_eq!(legs[0].flight_number, "PR 212");
        assert_eq!(legs[0].duration, "3H5M");
        assert_eq!(legs[0].cabin.as_deref(), Some("ECONOMY"));
        assert_eq!(legs[1].cabin.as_deref(), Some("BUSINESS"));
        assert_eq!(legs[1].emissions, UNKNOWN_EMISSIONS);
    }

    #[test]
    fn test_drops_offers_from_other_airports() {
        let offers = vec![
            offer(
                vec![vec![segment("1", "DMK", "SYD", "2023-08-02T10:00:00", "2023-08-02T20:00:00", "TG", "1")]],
                vec![fare(Some("1"), "ECONOMY")],
            ),
            offer(
                vec![vec![segment("1", "BKK", "SYD", "2023-08-02T10:00:00", "2023-08-02T20:00:00", "TG", "2")]],
                vec![fare(Some("1"), "ECONOMY")],
            ),
            offer(vec![], vec![]),
        ];

        let tickets = flights_filter("BKK", "SYD", true, &offers);
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].tickets.departure_ticket[0].flight.number, "2");
    }

    #[test]
    fn test_round_trip_cabins_by_position() {
        let offers = vec![offer(
            vec![
                vec![
                    segment("1", "JFK", "LHR", "2023-08-01T18:00:00", "2023-08-02T06:00:00", "BA", "178"),
                ],
                vec![
                    segment("2", "LHR", "DUB", "2023-08-10T09:00:00", "2023-08-10T10:20:00", "EI", "151"),
                    segment("3", "DUB", "JFK", "2023-08-10T12:00:00", "2023-08-10T14:30:00", "EI", "105"),
                ],
            ],
            vec![fare(None, "PREMIUM_ECONOMY"), fare(None, "ECONOMY"), fare(None, "FIRST")],
        )];

        let tickets = flights_filter("JFK", "LHR", false, &offers);
        let t = &tickets[0];
        assert!(!t.one_way);
        assert_eq!(t.total_return_duration.as_deref(), Some("PT12H"));
        assert_eq!(t.tickets.departure_ticket[0].cabin.as_deref(), Some("PREMIUM_ECONOMY"));

        let ret = t.tickets.return_ticket.as_ref().expect("return ticket");
        assert_eq!(ret.len(), 2);
        assert_eq!(ret[0].cabin.as_deref(), Some("ECONOMY"));
        assert_eq!(ret[1].cabin.as_deref(), Some("FIRST"));
        assert_eq!(ret[1].flight_number, "EI 105");
    }

    #[test]
    fn test_serialized_shape() {
        let offers = vec![offer(
            vec![vec![segment("1", "SYD", "BKK", "2023-08-02T11:35:00", "2023-08-02T17:45:00", "TG", "476")]],
            vec![fare(Some("1"), "ECONOMY")],
        )];
        let tickets = flights_filter("SYD", "BKK", true, &offers);
        let value = serde_json::to_value(&tickets[0]).unwrap();

        assert_eq!(value["type"], "flight-offer");
        assert_eq!(value["oneWay"], true);
        assert_eq!(value["total_price"]["total"], "812.40");
        let leg = &value["tickets"]["departure_ticket"][0];
        assert_eq!(leg["departure"]["iataCode"], "SYD");
        assert_eq!(leg["flight"]["carrierCode"], "TG");
        assert_eq!(leg["emissions"], -1);
        assert!(value.get("total_return_duration").is_none());
        assert!(value["tickets"].get("return_ticket").is_none());
    }

    #[test]
    fn test_cabins_match_segment_id_before_position() {
        let offers = vec![offer(
            vec![vec![
                segment("1", "SYD", "MNL", "2023-08-02T10:00:00", "2023-08-02T16:00:00", "PR", "212"),
                segment("2", "MNL", "BKK", "2023-08-02T18:00:00", "2023-08-02T20:35:00", "PR", "732"),
            ]],
            vec![fare(Some("2"), "BUSINESS"), fare(Some("1"), "ECONOMY")],
        )];

        let tickets = flights_filter("SYD", "BKK", true, &offers);
        let cabins: Vec<_> = tickets[0]
            .tickets
            .departure_ticket
            .iter()
            .map(|leg| leg.cabin.as_deref())
            .collect();
        assert_eq!(cabins, vec![Some("ECONOMY"), Some("BUSINESS")]);
    }

    #[test]
    fn test_round_trip_cabins_by_segment_id() {
        let offers = vec![offer(
            vec![
                vec![segment("1", "JFK", "LHR", "2023-08-01T18:00:00", "2023-08-02T06:00:00", "BA", "178")],
                vec![
                    segment("2", "LHR", "DUB", "2023-08-10T09:00:00", "2023-08-10T10:20:00", "EI", "151"),
                    segment("3", "DUB", "JFK", "2023-08-10T12:00:00", "2023-08-10T14:30:00", "EI", "105"),
                ],
            ],
            vec![fare(Some("3"), "FIRST"), fare(Some("1"), "BUSINESS"), fare(Some("2"), "ECONOMY")],
        )];

        let tickets = flights_filter("JFK", "LHR", false, &offers);
        let t = &tickets[0];
        assert_eq!(t.tickets.departure_ticket[0].cabin.as_deref(), Some("BUSINESS"));

        let ret = t.tickets.return_ticket.as_ref().expect("return ticket");
        assert_eq!(ret[0].cabin.as_deref(), Some("ECONOMY"));
        assert_eq!(ret[1].cabin.as_deref(), Some("FIRST"));
    }

    #[test]
    fn test_codeshare_keeps_operating_carrier() {
        let mut codeshare = segment("1", "SYD", "BKK", "2023-08-02T11:35:00", "2023-08-02T17:45:00", "NZ", "3901");
        codeshare.operating = Some(crate::offer::OperatingFlight { carrier_code: Some("TG".to_string()) });
        let own = segment("2", "BKK", "SYD", "2023-08-09T18:00:00", "2023-08-10T07:00:00", "TG", "475");

        let legs = segments_filter(&[codeshare, own]);
        assert_eq!(legs[0].flight_number, "NZ 3901");
        assert_eq!(legs[0].operating_carrier_code.as_deref(), Some("TG"));
        assert!(legs[1].operating_carrier_code.is_none());

        let value = serde_json::to_value(&legs[1]).unwrap();
        assert!(value.get("operating_carrier_code").is_none());
    }
}
