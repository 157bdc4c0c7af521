// Provider seam: the async trait every upstream inventory source implements,
// the per-provider query translation and the per-request outcome record.

use crate::config::{AggregatorConfig, ProviderSettings};
use crate::criteria::{Party, SearchCriteria, SearchKind};
use crate::supplier::ProviderPayload;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

// Age assumed for adults in pax lists
pub const ADULT_PAX_AGE: u8 = 30;
// Age assumed for children whose age was not given
pub const DEFAULT_CHILD_AGE: u8 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Provider task panicked: {0}")]
    Panicked(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Network(_) => "network",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Status { .. } => "status",
            ProviderError::MalformedPayload(_) => "malformed_payload",
            ProviderError::Panicked(_) => "panicked",
            ProviderError::Other(_) => "other",
        }
    }
}

// Provider failure captured as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&ProviderError> for ErrorInfo {
    fn from(error: &ProviderError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaxType {
    #[serde(rename = "AD")]
    Adult,
    #[serde(rename = "CH")]
    Child,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pax {
    #[serde(rename = "type")]
    pub pax_type: PaxType,
    pub age: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOccupancy {
    pub adults: u32,
    pub child_ages: Vec<u8>,
}

// Criteria in the shape upstream providers consume, shared by every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuery {
    pub search_kind: SearchKind,
    pub lat: f64,
    pub lng: f64,
    pub city_code: Option<String>,
    pub country_code: Option<String>,
    pub radius_km: f64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub adults: u32,
    pub children: u32,
    pub occupancies: Vec<RoomOccupancy>,
    pub pax: Vec<Pax>,
    pub currency: String,
    pub guest_nationality: String,
    pub limit: u32,
}

impl ProviderQuery {
    pub fn from_criteria(criteria: &SearchCriteria, kind: SearchKind) -> Self {
        Self {
            search_kind: kind,
            lat: criteria.location.lat,
            lng: criteria.location.lng,
            city_code: criteria.location.city_code.clone(),
            country_code: criteria.location.country_code.clone(),
            radius_km: criteria.radius_km,
            check_in: criteria.date_range.start,
            check_out: criteria.date_range.end,
            nights: criteria.date_range.nights(),
            adults: criteria.party.adults,
            children: criteria.party.children(),
            occupancies: room_occupancies(&criteria.party),
            pax: pax_list(&criteria.party),
            currency: criteria.currency.clone(),
            guest_nationality: criteria.guest_nationality.clone(),
            limit: criteria.result_limit,
        }
    }
}

// Adults are spread evenly (earlier rooms take the remainder), children round-robin.
// Never more rooms than adults, since every room needs one.
pub(crate) fn room_occupancies(party: &Party) -> Vec<RoomOccupancy> {
    let rooms = party.rooms.clamp(1, party.adults.max(1));
    let mut occupancies: Vec<RoomOccupancy> = (0..rooms)
        .map(|room| RoomOccupancy {
            adults: party.adults / rooms + u32::from(room < party.adults % rooms),
            child_ages: Vec::new(),
        })
        .collect();

    for (position, age) in party.child_ages.iter().enumerate() {
        occupancies[position % rooms as usize]
            .child_ages
            .push(age.unwrap_or(DEFAULT_CHILD_AGE));
    }
    occupancies
}

fn pax_list(party: &Party) -> Vec<Pax> {
    let adults = (0..party.adults).map(|_| Pax {
        pax_type: PaxType::Adult,
        age: ADULT_PAX_AGE,
    });
    let children = party.child_ages.iter().map(|age| Pax {
        pax_type: PaxType::Child,
        age: age.unwrap_or(DEFAULT_CHILD_AGE),
    });
    adults.chain(children).collect()
}

// Upstream inventory source
#[async_trait]
pub trait InventoryProvider: Send + Sync + 'static {
    fn id(&self) -> &str;

    // Providers that cannot serve a query decline it before any call is made
    fn accepts(&self, _query: &ProviderQuery) -> bool {
        true
    }

    async fn search(&self, query: &ProviderQuery) -> Result<ProviderPayload, ProviderError>;
}

// Maps one provider's payload into the common listing shape
pub trait PayloadNormalizer<L>: Send + Sync + 'static {
    fn normalize(
        &self,
        provider_id: &str,
        payload: ProviderPayload,
        query: &ProviderQuery,
    ) -> Result<Vec<L>, ProviderError>;
}

// Failures land in `error` with no listings; nothing propagates upward
#[derive(Debug, Clone)]
pub struct ProviderOutcome<L> {
    pub provider_id: String,
    pub listings: Vec<L>,
    pub elapsed_ms: u64,
    pub error: Option<ErrorInfo>,
}

impl<L> ProviderOutcome<L> {
    pub fn from_result(
        provider_id: String,
        result: Result<Vec<L>, ProviderError>,
        elapsed: Duration,
    ) -> Self {
        let elapsed_ms = elapsed.as_millis() as u64;
        match result {
            Ok(listings) => Self {
                provider_id,
                listings,
                elapsed_ms,
                error: None,
            },
            Err(error) => Self {
                provider_id,
                listings: Vec::new(),
                elapsed_ms,
                error: Some(ErrorInfo::from(&error)),
            },
        }
    }

    pub fn count(&self) -> usize {
        self.listings.len()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Clone)]
pub struct RegisteredProvider {
    pub provider: Arc<dyn InventoryProvider>,
    pub timeout: Duration,
}

impl RegisteredProvider {
    pub fn id(&self) -> &str {
        self.provider.id()
    }
}

pub struct ProviderRegistry {
    settings: HashMap<String, ProviderSettings>,
    hotel: Vec<RegisteredProvider>,
    transfer_primary: Option<RegisteredProvider>,
    transfer_fallback: Option<RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            settings: config.providers.clone(),
            hotel: Vec::new(),
            transfer_primary: None,
            transfer_fallback: None,
        }
    }

    fn admit(&self, provider: Arc<dyn InventoryProvider>) -> Option<RegisteredProvider> {
        let settings = self
            .settings
            .get(provider.id())
            .cloned()
            .unwrap_or_default();

        if !settings.enabled {
            info!(provider = %provider.id(), "Provider disabled, not registered");
            return None;
        }
        if !settings.credentials_present {
            warn!(provider = %provider.id(), "Provider credentials missing, not registered");
            return None;
        }

        Some(RegisteredProvider {
            timeout: settings.timeout(),
            provider,
        })
    }

    // Registration order is the dedup tie-break priority
    pub fn register_hotel(&mut self, provider: Arc<dyn InventoryProvider>) -> bool {
        match self.admit(provider) {
            Some(registered) => {
                self.hotel.push(registered);
                true
            }
            None => false,
        }
    }

    pub fn register_transfer_primary(&mut self, provider: Arc<dyn InventoryProvider>) -> bool {
        self.transfer_primary = self.admit(provider);
        self.transfer_primary.is_some()
    }

    pub fn register_transfer_fallback(&mut self, provider: Arc<dyn InventoryProvider>) -> bool {
        self.transfer_fallback = self.admit(provider);
        self.transfer_fallback.is_some()
    }

    pub fn hotel_providers(&self) -> &[RegisteredProvider] {
        &self.hotel
    }

    pub fn transfer_primary(&self) -> Option<&RegisteredProvider> {
        self.transfer_primary.as_ref()
    }

    pub fn transfer_fallback(&self) -> Option<&RegisteredProvider> {
        self.transfer_fallback.as_ref()
    }

    pub fn provider_ids(&self, kind: SearchKind) -> Vec<String> {
        match kind {
            SearchKind::Hotel => self.hotel.iter().map(|p| p.id().to_string()).collect(),
            SearchKind::Transfer => self
                .transfer_primary
                .iter()
                .chain(self.transfer_fallback.iter())
                .map(|p| p.id().to_string())
                .collect(),
        }
    }
}

// Scripted provider for tests
#[cfg(test)]
pub mod mock_provider {
    use super::*;
    use crate::supplier::{
        ActivitiesResponse, Activity, ActivityPrice, GeoCode, MinRateHotel, MinRatesResponse,
        TransferBase, TransferOffer, TransferOffersResponse, TransferQuotation, TransferSeat,
        TransferServiceProvider, TransferVehicle,
    };
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        Respond(ProviderPayload),
        Fail(ProviderError),
        Delay(Duration, ProviderPayload),
        Panic(&'static str),
    }

    pub struct MockProvider {
        id: String,
        behavior: Mutex<MockBehavior>,
        calls: AtomicUsize,
        requires_city_code: bool,
    }

    impl MockProvider {
        pub fn new(id: &str, behavior: MockBehavior) -> Arc<Self> {
            Arc::new(Self::build(id, behavior, false))
        }

        pub fn requiring_city_code(id: &str, behavior: MockBehavior) -> Arc<Self> {
            Arc::new(Self::build(id, behavior, true))
        }

        fn build(id: &str, behavior: MockBehavior, requires_city_code: bool) -> Self {
            Self {
                id: id.to_string(),
                behavior: Mutex::new(behavior),
                calls: AtomicUsize::new(0),
                requires_city_code,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InventoryProvider for MockProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn accepts(&self, query: &ProviderQuery) -> bool {
            !self.requires_city_code || query.city_code.is_some()
        }

        async fn search(&self, _query: &ProviderQuery) -> Result<ProviderPayload, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let behavior = self.behavior.lock().clone();
            match behavior {
                MockBehavior::Respond(payload) => Ok(payload),
                MockBehavior::Fail(error) => Err(error),
                MockBehavior::Delay(delay, payload) => {
                    tokio::time::sleep(delay).await;
                    Ok(payload)
                }
                MockBehavior::Panic(message) => panic!("{}", message),
            }
        }
    }

    // (name, lat, lng, total stay price)
    pub fn min_rates(hotels: &[(&str, f64, f64, Option<f64>)]) -> ProviderPayload {
        ProviderPayload::MinRates(MinRatesResponse {
            hotels: hotels
                .iter()
                .enumerate()
                .map(|(position, (name, lat, lng, total))| MinRateHotel {
                    id: format!("h{}", position),
                    name: name.to_string(),
                    latitude: Some(*lat),
                    longitude: Some(*lng),
                    total_price: *total,
                    ..Default::default()
                })
                .collect(),
            currency: Some("USD".to_string()),
        })
    }

    // (vehicle description, base price)
    pub fn transfer_offers(offers: &[(&str, Option<f64>)]) -> ProviderPayload {
        ProviderPayload::TransferOffers(TransferOffersResponse {
            data: offers
                .iter()
                .enumerate()
                .map(|(position, (vehicle, base))| TransferOffer {
                    id: format!("t{}", position),
                    transfer_type: Some("PRIVATE".to_string()),
                    vehicle: Some(TransferVehicle {
                        description: Some(vehicle.to_string()),
                        seats: vec![TransferSeat { count: 3 }],
                        ..Default::default()
                    }),
                    service_provider: Some(TransferServiceProvider {
                        name: Some("City Cars".to_string()),
                        ..Default::default()
                    }),
                    quotation: Some(TransferQuotation {
                        currency_code: Some("USD".to_string()),
                        base: Some(TransferBase {
                            monetary_amount: *base,
                        }),
                        ..Default::default()
                    }),
                    duration: Some("PT45M".to_string()),
                    ..Default::default()
                })
                .collect(),
        })
    }

    // (name, description, price)
    pub fn activities(items: &[(&str, &str, Option<f64>)]) -> ProviderPayload {
        ProviderPayload::Activities(ActivitiesResponse {
            data: items
                .iter()
                .enumerate()
                .map(|(position, (name, description, price))| Activity {
                    id: format!("a{}", position),
                    name: name.to_string(),
                    short_description: Some(description.to_string()),
                    geo_code: Some(GeoCode {
                        latitude: Some(40.6413 + position as f64 * 0.01),
                        longitude: Some(-73.7781),
                    }),
                    price: Some(ActivityPrice {
                        amount: *price,
                        currency_code: Some("USD".to_string()),
                    }),
                    ..Default::default()
                })
                .collect(),
        })
    }
}
