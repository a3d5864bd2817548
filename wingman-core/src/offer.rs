use serde::{Deserialize, Serialize};

// ============================================================================
// Flight Offers Search payload (only the fields the ticket pipeline reads)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    #[serde(rename = "type", default = "default_offer_type")]
    pub offer_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    pub price: OfferPrice,
    #[serde(default)]
    pub traveler_pricings: Vec<TravelerPricing>,
}

fn default_offer_type() -> String {
    "flight-offer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub id: Option<String>,
    pub departure: SegmentPoint,
    pub arrival: SegmentPoint,
    pub carrier_code: String,
    pub number: String,
    #[serde(default)]
    pub duration: Option<String>,
    /// Present on codeshares, where `carrier_code` is the marketing carrier.
    #[serde(default)]
    pub operating: Option<OperatingFlight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingFlight {
    #[serde(default)]
    pub carrier_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPoint {
    pub iata_code: String,
    /// Local time at the airport, e.g. `2023-08-02T23:10:00`.
    pub at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPrice {
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerPricing {
    #[serde(default)]
    pub fare_details_by_segment: Vec<FareDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareDetails {
    #[serde(default)]
    pub segment_id: Option<String>,
    #[serde(default)]
    pub cabin: Option<String>,
}
