// Per-provider normalizers: heterogeneous payloads into NormalizedListing / NormalizedTransfer
//
// Field resolution order (first populated field wins):
//
// | provider        | price                                   | stars               | review score           |
// |-----------------|-----------------------------------------|---------------------|------------------------|
// | MinRates        | minimumRate.amount > totalPrice > price | stars > category    | reviewScore > rating   |
// | HotelOffers     | first offer total > base                | hotel.rating        | -                      |
// | AvailXml        | cheapest room amount (net, marked up)   | @category           | -                      |
// | Properties      | basePricePerNight > cheapest room       | starRating          | reviewScore            |
// | TransferOffers  | quotation.base > quotation (marked up)  | -                   | -                      |
// | Activities      | price.amount (marked up)                | -                   | rating                 |
//
// Stay prices are converted to per-night amounts; the stay total is kept alongside.

use crate::classifier::{estimate_duration_minutes, parse_iso_duration_minutes, TransferClassifier};
use crate::listing::{
    sanitize_amount, ListingLocation, MediaItem, NormalizedListing, NormalizedTransfer,
    OperatorContact, Policy, PriceInfo, RatingInfo, RoomRate, TransferType, VehicleInfo,
};
use crate::pricing::{marked_up, round_cents};
use crate::provider::{PayloadNormalizer, ProviderError, ProviderQuery};
use crate::supplier::{
    ActivitiesResponse, HotelOffersResponse, MinRatesResponse, PropertiesResponse, ProviderPayload,
    TransferOffer, TransferOffersResponse,
};
use crate::xml_response::{XmlAvailResponse, XmlHotel};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct HotelNormalizer;

impl PayloadNormalizer<NormalizedListing> for HotelNormalizer {
    fn normalize(
        &self,
        provider_id: &str,
        payload: ProviderPayload,
        query: &ProviderQuery,
    ) -> Result<Vec<NormalizedListing>, ProviderError> {
        let listings = match payload {
            ProviderPayload::MinRates(response) => from_min_rates(provider_id, response, query),
            ProviderPayload::HotelOffers(response) => from_hotel_offers(provider_id, response, query),
            ProviderPayload::AvailXml(response) => from_avail_xml(provider_id, response, query),
            ProviderPayload::Properties(response) => from_properties(provider_id, response, query),
            other => {
                return Err(ProviderError::MalformedPayload(format!(
                    "{} payload cannot describe hotels",
                    other.kind_name()
                )))
            }
        };
        debug!(provider = %provider_id, count = listings.len(), "Normalized hotel payload");
        Ok(listings)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferNormalizer {
    classifier: Arc<TransferClassifier>,
}

impl TransferNormalizer {
    pub fn new(classifier: Arc<TransferClassifier>) -> Self {
        Self { classifier }
    }
}

impl PayloadNormalizer<NormalizedTransfer> for TransferNormalizer {
    fn normalize(
        &self,
        provider_id: &str,
        payload: ProviderPayload,
        query: &ProviderQuery,
    ) -> Result<Vec<NormalizedTransfer>, ProviderError> {
        let transfers = match payload {
            ProviderPayload::TransferOffers(response) => {
                from_transfer_offers(provider_id, response, query, &self.classifier)
            }
            ProviderPayload::Activities(response) => {
                from_activities(provider_id, response, query, &self.classifier)
            }
            other => {
                return Err(ProviderError::MalformedPayload(format!(
                    "{} payload cannot describe transfers",
                    other.kind_name()
                )))
            }
        };
        debug!(provider = %provider_id, count = transfers.len(), "Normalized transfer payload");
        Ok(transfers)
    }
}

fn first_some<T: Copy>(candidates: &[Option<T>]) -> Option<T> {
    candidates.iter().find_map(|c| *c)
}

fn first_text(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

fn parse_amount(text: &str) -> Option<f64> {
    sanitize_amount(text.trim().parse::<f64>().ok())
}

fn per_night(total: Option<f64>, nights: u32) -> Option<f64> {
    sanitize_amount(total).map(|t| round_cents(t / nights.max(1) as f64))
}

// Missing coordinates fall back to the search centre so the listing can still be keyed
fn coordinates(lat: Option<f64>, lng: Option<f64>, query: &ProviderQuery) -> (f64, f64) {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
        _ => (query.lat, query.lng),
    }
}

fn media_from(urls: impl IntoIterator<Item = String>, alt: &str) -> Vec<MediaItem> {
    urls.into_iter()
        .filter(|url| !url.trim().is_empty())
        .map(|url| MediaItem {
            url,
            alt: Some(alt.to_string()),
        })
        .collect()
}

fn stay_price(total: Option<f64>, currency: String, query: &ProviderQuery) -> PriceInfo {
    PriceInfo::new(per_night(total, query.nights), currency, true).with_total(total)
}

fn from_min_rates(
    provider_id: &str,
    response: MinRatesResponse,
    query: &ProviderQuery,
) -> Vec<NormalizedListing> {
    let feed_currency = response.currency.clone();
    response
        .hotels
        .into_iter()
        .filter(|hotel| hotel.available != Some(false) && hotel.deleted_at.is_none())
        .map(|hotel| {
            let rate = hotel.minimum_rate.clone().unwrap_or_default();
            let total = sanitize_amount(first_some(&[rate.amount, hotel.total_price, hotel.price]));
            let currency = first_text(&[rate.currency.as_deref(), feed_currency.as_deref()])
                .unwrap_or_else(|| query.currency.clone());
            let (lat, lng) = coordinates(hotel.latitude, hotel.longitude, query);
            let photos = [hotel.main_photo.clone(), hotel.thumbnail.clone()];

            NormalizedListing {
                id: format!("{}_{}", provider_id, hotel.id),
                source_provider: provider_id.to_string(),
                description: hotel.hotel_description.clone(),
                location: ListingLocation {
                    lat,
                    lng,
                    address: hotel.address.clone(),
                    city: hotel.city.clone(),
                    country: hotel.country.clone(),
                },
                price_info: stay_price(total, currency, query),
                rating_info: RatingInfo {
                    stars: first_some(&[hotel.stars, hotel.category]),
                    review_score: first_some(&[hotel.review_score, hotel.rating]),
                    review_count: hotel.review_count.unwrap_or(0),
                },
                media: media_from(photos.into_iter().flatten().take(1), &hotel.name),
                amenities: hotel.amenities,
                policy: Policy {
                    refundable: hotel.refundable.unwrap_or(false),
                    cancellation_deadline: hotel.cancellation_deadline,
                },
                board_type: hotel.board_type,
                rates: Vec::new(),
                display_name: hotel.name,
            }
        })
        .collect()
}

fn from_hotel_offers(
    provider_id: &str,
    response: HotelOffersResponse,
    query: &ProviderQuery,
) -> Vec<NormalizedListing> {
    response
        .data
        .into_iter()
        .filter(|entry| entry.available != Some(false))
        .map(|entry| {
            let hotel = entry.hotel;
            let default_currency = query.currency.clone();

            let rates: Vec<RoomRate> = entry
                .offers
                .iter()
                .map(|offer| {
                    let total = first_some(&[offer.price.total, offer.price.base]);
                    let currency = offer.price.currency.clone().unwrap_or_else(|| default_currency.clone());
                    let room = offer.room.clone().unwrap_or_default();
                    RoomRate {
                        id: offer.id.clone(),
                        room_type: first_text(&[
                            room.room_type.as_deref(),
                            room.description.as_ref().map(|d| d.text.as_str()),
                        ])
                        .unwrap_or_else(|| "Standard".to_string()),
                        board_type: offer.board_type.clone().unwrap_or_else(|| "ROOM_ONLY".to_string()),
                        price: stay_price(total, currency, query),
                        refundable: offer
                            .policies
                            .as_ref()
                            .and_then(|p| p.refundable.as_ref())
                            .and_then(|r| r.cancellation_refund.as_deref())
                            .map_or(false, |refund| refund != "NON_REFUNDABLE"),
                        max_occupancy: None,
                    }
                })
                .collect();

            let first_offer = entry.offers.first();
            let price_info = rates
                .first()
                .map(|rate| rate.price.clone())
                .unwrap_or_else(|| PriceInfo::absent(default_currency.clone()));
            let deadline = first_offer
                .and_then(|offer| offer.policies.as_ref())
                .and_then(|p| p.cancellations.iter().find_map(|c| c.deadline.clone()));
            let address = hotel.address.clone().unwrap_or_default();
            let (lat, lng) = coordinates(hotel.latitude, hotel.longitude, query);

            NormalizedListing {
                id: format!("{}_{}", provider_id, hotel.hotel_id),
                source_provider: provider_id.to_string(),
                description: hotel.description.map(|d| d.text),
                location: ListingLocation {
                    lat,
                    lng,
                    address: (!address.lines.is_empty()).then(|| address.lines.join(", ")),
                    city: address.city_name,
                    country: address.country_code,
                },
                price_info,
                rating_info: RatingInfo {
                    stars: hotel.rating,
                    review_score: None,
                    review_count: 0,
                },
                media: media_from(hotel.media.into_iter().map(|m| m.uri), &hotel.name),
                amenities: hotel.amenities,
                policy: Policy {
                    refundable: rates.first().map_or(false, |rate| rate.refundable),
                    cancellation_deadline: deadline,
                },
                board_type: rates.first().map(|rate| rate.board_type.clone()),
                rates,
                display_name: hotel.name,
            }
        })
        .collect()
}

// Wholesale net rates: the customer-facing markup applies to the stay total
fn from_avail_xml(
    provider_id: &str,
    response: XmlAvailResponse,
    query: &ProviderQuery,
) -> Vec<NormalizedListing> {
    response
        .hotels
        .hotels
        .into_iter()
        .map(|hotel| avail_hotel(provider_id, hotel, query))
        .collect()
}

fn avail_hotel(provider_id: &str, hotel: XmlHotel, query: &ProviderQuery) -> NormalizedListing {
    let mut rates = Vec::new();
    let mut deadlines = Vec::new();

    for meal_plan in &hotel.meal_plans.meal_plans {
        for option in &meal_plan.options.options {
            for room in &option.rooms.rooms {
                let net = parse_amount(&room.price.amount).or_else(|| parse_amount(&option.price.amount));
                let currency = first_text(&[Some(room.price.currency.as_str()), Some(option.price.currency.as_str())])
                    .unwrap_or_else(|| query.currency.clone());
                rates.push(RoomRate {
                    id: format!("{}#{}", meal_plan.code, room.id),
                    room_type: first_text(&[Some(room.description.as_str()), Some(room.code.as_str())])
                        .unwrap_or_else(|| "Standard".to_string()),
                    board_type: meal_plan.code.clone(),
                    price: stay_price(marked_up(net), currency, query),
                    refundable: room.is_refundable(),
                    max_occupancy: room.max_occupancy.trim().parse().ok(),
                });
                deadlines.push(
                    room.cancel_penalties
                        .cancel_penalties
                        .iter()
                        .map(|p| p.deadline.trim())
                        .find(|d| !d.is_empty())
                        .map(str::to_string),
                );
            }
        }
    }

    let cheapest = rates
        .iter()
        .enumerate()
        .filter(|(_, rate)| rate.price.amount.is_some())
        .min_by(|(_, a), (_, b)| {
            a.price
                .amount
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.price.amount.unwrap_or(f64::INFINITY))
        })
        .map(|(position, _)| position);

    let (lat, lng) = coordinates(
        hotel.latitude.trim().parse().ok(),
        hotel.longitude.trim().parse().ok(),
        query,
    );
    let cheapest_rate = cheapest.map(|position| &rates[position]);

    NormalizedListing {
        id: format!("{}_{}", provider_id, hotel.hotel_id),
        source_provider: provider_id.to_string(),
        description: None,
        location: ListingLocation {
            lat,
            lng,
            address: first_text(&[Some(hotel.address.as_str())]),
            city: first_text(&[Some(hotel.city.as_str())]),
            country: first_text(&[Some(hotel.country_code.as_str())]),
        },
        price_info: cheapest_rate
            .map(|rate| rate.price.clone())
            .unwrap_or_else(|| PriceInfo::absent(query.currency.clone())),
        rating_info: RatingInfo {
            stars: hotel.category.trim().parse().ok(),
            review_score: None,
            review_count: 0,
        },
        media: Vec::new(),
        amenities: Vec::new(),
        policy: Policy {
            refundable: cheapest_rate.map_or(false, |rate| rate.refundable),
            cancellation_deadline: cheapest.and_then(|position| deadlines[position].clone()),
        },
        board_type: cheapest_rate.map(|rate| rate.board_type.clone()),
        display_name: hotel.hotel_name,
        rates,
    }
}

fn from_properties(
    provider_id: &str,
    response: PropertiesResponse,
    query: &ProviderQuery,
) -> Vec<NormalizedListing> {
    response
        .properties
        .into_iter()
        .map(|property| {
            let currency = property.currency.clone().unwrap_or_else(|| query.currency.clone());
            let cheapest_room = property
                .rooms
                .iter()
                .filter_map(|room| sanitize_amount(room.base_price))
                .min_by(f64::total_cmp);
            let nightly = sanitize_amount(first_some(&[property.base_price_per_night, cheapest_room]));
            let total = nightly.map(|n| round_cents(n * query.nights as f64));
            let refundable = matches!(
                property.cancellation_policy.as_deref().map(str::to_lowercase).as_deref(),
                Some("flexible") | Some("moderate")
            );
            let (lat, lng) = coordinates(property.latitude, property.longitude, query);

            let rates = property
                .rooms
                .iter()
                .map(|room| RoomRate {
                    id: room.id.clone(),
                    room_type: room.name.clone(),
                    board_type: "ROOM_ONLY".to_string(),
                    price: PriceInfo::new(room.base_price, currency.clone(), true).with_total(
                        sanitize_amount(room.base_price).map(|n| round_cents(n * query.nights as f64)),
                    ),
                    refundable,
                    max_occupancy: room.max_guests,
                })
                .collect();

            NormalizedListing {
                id: format!("{}_{}", provider_id, property.id),
                source_provider: provider_id.to_string(),
                description: property.description,
                location: ListingLocation {
                    lat,
                    lng,
                    address: property.address,
                    city: property.city,
                    country: property.country,
                },
                price_info: PriceInfo::new(nightly, currency, true).with_total(total),
                rating_info: RatingInfo {
                    stars: property.star_rating,
                    review_score: property.review_score,
                    review_count: property.review_count.unwrap_or(0),
                },
                media: media_from(property.images, &property.name),
                amenities: property.amenities,
                policy: Policy {
                    refundable,
                    cancellation_deadline: None,
                },
                board_type: None,
                rates,
                display_name: property.name,
            }
        })
        .collect()
}

fn transfer_type_from_code(code: &str) -> Option<TransferType> {
    match code.trim().to_uppercase().as_str() {
        "PRIVATE" | "HOURLY" => Some(TransferType::Private),
        "SHARED" => Some(TransferType::Shared),
        "TAXI" => Some(TransferType::Taxi),
        "AIRPORT_EXPRESS" | "AIRPORT_SHUTTLE" => Some(TransferType::Shuttle),
        _ => None,
    }
}

fn from_transfer_offers(
    provider_id: &str,
    response: TransferOffersResponse,
    query: &ProviderQuery,
    classifier: &TransferClassifier,
) -> Vec<NormalizedTransfer> {
    response
        .data
        .into_iter()
        .map(|offer| transfer_offer(provider_id, offer, query, classifier))
        .collect()
}

fn transfer_offer(
    provider_id: &str,
    offer: TransferOffer,
    query: &ProviderQuery,
    classifier: &TransferClassifier,
) -> NormalizedTransfer {
    let vehicle = offer.vehicle.clone().unwrap_or_default();
    let operator = offer.service_provider.clone().unwrap_or_default();
    let quotation = offer.quotation.clone().unwrap_or_default();
    let contacts = operator.contacts.clone().unwrap_or_default();
    let address = offer
        .start
        .as_ref()
        .and_then(|start| start.address.clone())
        .unwrap_or_default();

    let description = first_text(&[
        vehicle.description.as_deref(),
        vehicle.category.as_deref(),
        vehicle.code.as_deref(),
    ])
    .unwrap_or_else(|| "Standard vehicle".to_string());

    let quoted_seats: u32 = vehicle.seats.iter().map(|s| s.count).sum();
    let (capacity, capacity_estimated) = if quoted_seats > 0 {
        (quoted_seats, false)
    } else {
        (classifier.estimate_capacity(&description).0, true)
    };

    let transfer_type = offer
        .transfer_type
        .as_deref()
        .and_then(transfer_type_from_code)
        .unwrap_or_else(|| classifier.classify(&description));

    let base = sanitize_amount(first_some(&[
        quotation.base.as_ref().and_then(|b| b.monetary_amount),
        quotation.monetary_amount,
    ]));
    let currency = quotation.currency_code.clone().unwrap_or_else(|| query.currency.clone());
    let refundable = offer
        .cancellation_rules
        .iter()
        .any(|rule| rule.fee_value == Some(0.0));
    let (lat, lng) = coordinates(address.latitude, address.longitude, query);

    let display_name = match operator.name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("{} - {}", name.trim(), description),
        _ => description.clone(),
    };

    let mut features = Vec::new();
    if let Some(category) = &vehicle.category {
        features.push(category.clone());
    }
    if refundable {
        features.push("Free cancellation".to_string());
    }

    NormalizedTransfer {
        id: format!("{}_{}", provider_id, offer.id),
        source_provider: provider_id.to_string(),
        display_name,
        description: None,
        location: ListingLocation {
            lat,
            lng,
            address: address.line,
            city: address.city_name,
            country: address.country_code,
        },
        price_info: PriceInfo::new(marked_up(base), currency, false),
        rating_info: RatingInfo::default(),
        media: media_from(vehicle.image_url.clone(), &description),
        features,
        policy: Policy {
            refundable,
            cancellation_deadline: offer
                .cancellation_rules
                .iter()
                .find_map(|rule| rule.deadline.clone()),
        },
        transfer_type,
        vehicle: VehicleInfo {
            description,
            code: vehicle.code,
            capacity,
            capacity_estimated,
        },
        operator: OperatorContact {
            name: operator.name,
            phone: contacts.phone_number,
            email: contacts.email,
            booking_url: None,
        },
        duration_minutes: offer.duration.as_deref().and_then(parse_iso_duration_minutes),
        base_price: base,
    }
}

// Fallback path: generic activities, restricted to transfer-like items and reclassified
fn from_activities(
    provider_id: &str,
    response: ActivitiesResponse,
    query: &ProviderQuery,
    classifier: &TransferClassifier,
) -> Vec<NormalizedTransfer> {
    let total = response.data.len();
    let transfers: Vec<NormalizedTransfer> = response
        .data
        .into_iter()
        .filter_map(|activity| {
            let text = format!(
                "{} {} {}",
                activity.name,
                activity.short_description.as_deref().unwrap_or_default(),
                activity.description.as_deref().unwrap_or_default()
            );
            if !classifier.is_transfer(&text) {
                return None;
            }

            let transfer_type = classifier.classify(&text);
            let (capacity, vehicle_keyword) = classifier.estimate_capacity(&text);
            let vehicle_description = match vehicle_keyword {
                Some(keyword) => capitalize(keyword),
                None => "Sedan".to_string(),
            };
            let duration_minutes = activity
                .minimum_duration
                .as_deref()
                .and_then(|d| parse_iso_duration_minutes(d).or_else(|| estimate_duration_minutes(d)))
                .or_else(|| estimate_duration_minutes(&text));

            let price = activity.price.clone().unwrap_or_default();
            let base = sanitize_amount(price.amount);
            let currency = price.currency_code.unwrap_or_else(|| query.currency.clone());
            let geo = activity.geo_code.clone().unwrap_or_default();
            let (lat, lng) = coordinates(geo.latitude, geo.longitude, query);

            Some(NormalizedTransfer {
                id: format!("{}_{}", provider_id, activity.id),
                source_provider: provider_id.to_string(),
                description: first_text(&[
                    activity.short_description.as_deref(),
                    activity.description.as_deref(),
                ]),
                location: ListingLocation {
                    lat,
                    lng,
                    ..Default::default()
                },
                price_info: PriceInfo::new(marked_up(base), currency, false),
                rating_info: RatingInfo {
                    stars: None,
                    review_score: activity.rating,
                    review_count: 0,
                },
                media: media_from(activity.pictures, &activity.name),
                features: Vec::new(),
                policy: Policy::default(),
                transfer_type,
                vehicle: VehicleInfo {
                    description: vehicle_description,
                    code: None,
                    capacity,
                    capacity_estimated: true,
                },
                operator: OperatorContact {
                    booking_url: activity.booking_link,
                    ..Default::default()
                },
                duration_minutes,
                base_price: base,
                display_name: activity.name,
            })
        })
        .collect();

    debug!(
        provider = %provider_id,
        activities = total,
        transfers = transfers.len(),
        "Reclassified activities as transfers"
    );
    transfers
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::fixtures::paris_criteria;
    use crate::criteria::SearchKind;
    use crate::provider::mock_provider::{activities, transfer_offers};
    use crate::supplier::{HotelOffersResponse, PropertiesResponse};
    use crate::xml_response::{decode_avail_xml, SAMPLE_AVAIL_XML};
    use serde_json::json;

    // Paris, three nights
    fn query() -> ProviderQuery {
        ProviderQuery::from_criteria(&paris_criteria(), SearchKind::Hotel)
    }

    fn hotels(payload: ProviderPayload) -> Vec<NormalizedListing> {
        HotelNormalizer.normalize("test", payload, &query()).unwrap()
    }

    #[test]
    fn test_min_rates_price_priority_and_per_night() {
        let response: MinRatesResponse = serde_json::from_value(json!({
            "hotels": [
                { "id": "a", "name": "Rate First", "latitude": 48.86, "longitude": 2.35,
                  "minimumRate": { "amount": 300, "currency": "EUR" }, "totalPrice": 450, "price": 600 },
                { "id": "b", "name": "Total Second", "latitude": 48.86, "longitude": 2.35,
                  "totalPrice": "450", "price": 600, "category": 4, "rating": 8.7 },
                { "id": "c", "name": "No Price", "latitude": 48.86, "longitude": 2.35 },
                { "id": "d", "name": "Sold Out", "available": false, "price": 10 }
            ]
        }))
        .unwrap();

        let listings = hotels(ProviderPayload::MinRates(response));
        assert_eq!(listings.len(), 3);

        assert_eq!(listings[0].price_info.amount, Some(100.0));
        assert_eq!(listings[0].price_info.total, Some(300.0));
        assert_eq!(listings[0].price_info.currency, "EUR");
        assert!(listings[0].price_info.is_per_night);

        assert_eq!(listings[1].price_info.amount, Some(150.0));
        assert_eq!(listings[1].rating_info.stars, Some(4.0));
        assert_eq!(listings[1].rating_info.review_score, Some(8.7));
        assert_eq!(listings[1].price_info.currency, "USD");

        // Missing price stays absent, never zero
        assert_eq!(listings[2].price_info.amount, None);
        assert_eq!(listings[2].id, "test_c");
    }

    #[test]
    fn test_hotel_offers_use_first_offer_and_search_centre() {
        let response: HotelOffersResponse = serde_json::from_value(json!({
            "data": [{
                "hotel": { "hotelId": "PARLUT", "name": "Hotel Lutetia", "rating": "5",
                           "address": { "lines": ["45 Boulevard Raspail"], "cityName": "PARIS", "countryCode": "FR" } },
                "offers": [
                    { "id": "O1", "boardType": "BREAKFAST", "price": { "currency": "EUR", "total": "900.00" },
                      "policies": { "refundable": { "cancellationRefund": "REFUNDABLE_UP_TO_DEADLINE" },
                                    "cancellations": [ { "deadline": "2026-11-08T23:59:00+01:00" } ] } },
                    { "id": "O2", "price": { "currency": "EUR", "base": "600.00" } }
                ]
            }]
        }))
        .unwrap();

        let listing = &hotels(ProviderPayload::HotelOffers(response))[0];
        let query = query();
        assert_eq!(listing.price_info.amount, Some(300.0));
        assert_eq!(listing.location.lat, query.lat);
        assert_eq!(listing.location.address.as_deref(), Some("45 Boulevard Raspail"));
        assert_eq!(listing.rating_info.stars, Some(5.0));
        assert!(listing.policy.refundable);
        assert_eq!(
            listing.policy.cancellation_deadline.as_deref(),
            Some("2026-11-08T23:59:00+01:00")
        );
        assert_eq!(listing.rates.len(), 2);
        assert_eq!(listing.rates[1].price.amount, Some(200.0));
        assert_eq!(listing.board_type.as_deref(), Some("BREAKFAST"));
    }

    #[test]
    fn test_wholesale_xml_rates_are_marked_up() {
        let response = decode_avail_xml(SAMPLE_AVAIL_XML).unwrap();
        let listing = &hotels(ProviderPayload::AvailXml(response))[0];

        // 200 net -> 270 retail for three nights
        assert_eq!(listing.price_info.total, Some(270.0));
        assert_eq!(listing.price_info.amount, Some(90.0));
        assert_eq!(listing.board_type.as_deref(), Some("RO"));
        assert!(listing.policy.refundable);
        assert_eq!(
            listing.policy.cancellation_deadline.as_deref(),
            Some("2026-11-08T12:00:00Z")
        );
        assert_eq!(listing.location.lat, 48.8511);
        assert_eq!(listing.rating_info.stars, Some(5.0));
        assert_eq!(listing.rates.len(), 2);
        // 260 net -> 351 retail
        assert_eq!(listing.rates[1].price.total, Some(351.0));
        assert!(!listing.rates[1].refundable);
    }

    #[test]
    fn test_properties_fall_back_to_cheapest_room() {
        let response: PropertiesResponse = serde_json::from_value(json!({
            "properties": [{
                "id": "p1", "name": "Canal Loft", "latitude": 48.87, "longitude": 2.36,
                "starRating": 3, "cancellationPolicy": "Flexible",
                "rooms": [
                    { "id": "r1", "name": "Loft", "basePrice": 140 },
                    { "id": "r2", "name": "Studio", "basePrice": 95.5 }
                ]
            }]
        }))
        .unwrap();

        let listing = &hotels(ProviderPayload::Properties(response))[0];
        assert_eq!(listing.price_info.amount, Some(95.5));
        assert_eq!(listing.price_info.total, Some(286.5));
        assert!(listing.policy.refundable);
        assert_eq!(listing.rates.len(), 2);
    }

    #[test]
    fn test_wrong_payload_kind_is_malformed() {
        let result = HotelNormalizer.normalize("test", activities(&[]), &query());
        assert!(matches!(result, Err(ProviderError::MalformedPayload(_))));
    }

    #[test]
    fn test_transfer_offers_apply_markup_and_parse_duration() {
        let normalizer = TransferNormalizer::default();
        let transfers = normalizer
            .normalize("transfers", transfer_offers(&[("Mercedes E-Class", Some(50.0)), ("Van", None)]), &query())
            .unwrap();

        assert_eq!(transfers.len(), 2);
        let first = &transfers[0];
        assert_eq!(first.base_price, Some(50.0));
        assert_eq!(first.price_info.amount, Some(85.0));
        assert!(!first.price_info.is_per_night);
        assert_eq!(first.duration_minutes, Some(45));
        assert_eq!(first.transfer_type, TransferType::Private);
        assert_eq!(first.vehicle.capacity, 3);
        assert!(!first.vehicle.capacity_estimated);
        assert_eq!(first.display_name, "City Cars - Mercedes E-Class");
        assert_eq!(transfers[1].price_info.amount, None);
    }

    #[test]
    fn test_activities_are_filtered_and_classified() {
        let normalizer = TransferNormalizer::default();
        let payload = activities(&[
            ("JFK Shared Shuttle", "Door to door minibus, approx 1 hour", Some(20.0)),
            ("Central Park Bike Tour", "Two hours of cycling", Some(40.0)),
            ("Private Airport Transfer", "Sedan pickup, 45 min", Some(200.0)),
        ]);

        let transfers = normalizer.normalize("activities", payload, &query()).unwrap();
        assert_eq!(transfers.len(), 2);

        let shuttle = &transfers[0];
        assert_eq!(shuttle.transfer_type, TransferType::Shared);
        assert_eq!(shuttle.vehicle.capacity, 16);
        assert_eq!(shuttle.vehicle.description, "Minibus");
        assert!(shuttle.vehicle.capacity_estimated);
        assert_eq!(shuttle.duration_minutes, Some(60));
        assert_eq!(shuttle.price_info.amount, Some(55.0));

        let private = &transfers[1];
        assert_eq!(private.transfer_type, TransferType::Private);
        assert_eq!(private.vehicle.capacity, 3);
        assert_eq!(private.duration_minutes, Some(45));
        assert_eq!(private.price_info.amount, Some(270.0));
    }
}
