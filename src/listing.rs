// Unified listing shapes shared by every provider once normalized

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

// Amount is None when the provider did not quote a price; never NaN or negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    pub amount: Option<f64>,
    pub currency: String,
    pub is_per_night: bool,
    // Whole-stay (or whole-trip) price when the provider quoted one
    pub total: Option<f64>,
}

impl PriceInfo {
    pub fn new(amount: Option<f64>, currency: impl Into<String>, is_per_night: bool) -> Self {
        Self {
            amount: sanitize_amount(amount),
            currency: currency.into(),
            is_per_night,
            total: None,
        }
    }

    pub fn with_total(mut self, total: Option<f64>) -> Self {
        self.total = sanitize_amount(total);
        self
    }

    pub fn absent(currency: impl Into<String>) -> Self {
        Self::new(None, currency, false)
    }
}

// NaN, infinite and negative amounts are not prices
pub fn sanitize_amount(amount: Option<f64>) -> Option<f64> {
    amount.filter(|a| a.is_finite() && *a >= 0.0)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingInfo {
    pub stars: Option<f64>,
    pub review_score: Option<f64>,
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub url: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub refundable: bool,
    pub cancellation_deadline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRate {
    pub id: String,
    pub room_type: String,
    pub board_type: String,
    pub price: PriceInfo,
    pub refundable: bool,
    pub max_occupancy: Option<u32>,
}

// Hotel listing after normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedListing {
    pub id: String,
    pub source_provider: String,
    pub display_name: String,
    pub description: Option<String>,
    pub location: ListingLocation,
    pub price_info: PriceInfo,
    pub rating_info: RatingInfo,
    pub media: Vec<MediaItem>,
    pub amenities: Vec<String>,
    pub policy: Policy,
    pub board_type: Option<String>,
    pub rates: Vec<RoomRate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    Private,
    Shared,
    Taxi,
    Luxury,
    Shuttle,
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferType::Private => "PRIVATE",
            TransferType::Shared => "SHARED",
            TransferType::Taxi => "TAXI",
            TransferType::Luxury => "LUXURY",
            TransferType::Shuttle => "SHUTTLE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub description: String,
    pub code: Option<String>,
    pub capacity: u32,
    // True when capacity was inferred from free text rather than quoted
    pub capacity_estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub booking_url: Option<String>,
}

// Ground transfer listing after normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransfer {
    pub id: String,
    pub source_provider: String,
    pub display_name: String,
    pub description: Option<String>,
    pub location: ListingLocation,
    pub price_info: PriceInfo,
    pub rating_info: RatingInfo,
    pub media: Vec<MediaItem>,
    pub features: Vec<String>,
    pub policy: Policy,
    pub transfer_type: TransferType,
    pub vehicle: VehicleInfo,
    pub operator: OperatorContact,
    pub duration_minutes: Option<u32>,
    pub base_price: Option<f64>,
}

// Folded name plus coordinates floored to 3 decimals (about 100m)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(display_name: &str, lat: f64, lng: f64) -> Self {
        Self(format!(
            "{}:{}:{}",
            display_name.trim().to_lowercase(),
            (lat * 1000.0).floor() as i64,
            (lng * 1000.0).floor() as i64
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Common view over hotel and transfer listings used by merge, filter and cache
pub trait Listing: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn display_name(&self) -> &str;
    fn source_provider(&self) -> &str;
    fn location(&self) -> &ListingLocation;
    fn price(&self) -> Option<f64>;
    fn rating(&self) -> Option<f64>;

    fn dedup_key(&self) -> DedupKey {
        let location = self.location();
        DedupKey::new(self.display_name(), location.lat, location.lng)
    }

    // Absent prices compare as +infinity
    fn effective_price(&self) -> f64 {
        self.price().unwrap_or(f64::INFINITY)
    }
}

impl Listing for NormalizedListing {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn source_provider(&self) -> &str {
        &self.source_provider
    }

    fn location(&self) -> &ListingLocation {
        &self.location
    }

    fn price(&self) -> Option<f64> {
        self.price_info.amount
    }

    fn rating(&self) -> Option<f64> {
        self.rating_info.stars
    }
}

impl Listing for NormalizedTransfer {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn source_provider(&self) -> &str {
        &self.source_provider
    }

    fn location(&self) -> &ListingLocation {
        &self.location
    }

    fn price(&self) -> Option<f64> {
        self.price_info.amount
    }

    // Transfers rarely carry star ratings; review score stands in
    fn rating(&self) -> Option<f64> {
        self.rating_info.stars.or(self.rating_info.review_score)
    }
}
