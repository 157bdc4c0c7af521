// Raw provider payload schemas, as each upstream sends them
//
// Field names differ between providers on purpose; the normalizers resolve
// them in a fixed priority order. Numbers that some providers send as strings
// go through `flexible_f64`.

use crate::xml_response::XmlAvailResponse;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Tagged union over every payload shape a provider can return
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    MinRates(MinRatesResponse),
    HotelOffers(HotelOffersResponse),
    AvailXml(XmlAvailResponse),
    Properties(PropertiesResponse),
    TransferOffers(TransferOffersResponse),
    Activities(ActivitiesResponse),
}

impl ProviderPayload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ProviderPayload::MinRates(_) => "min_rates",
            ProviderPayload::HotelOffers(_) => "hotel_offers",
            ProviderPayload::AvailXml(_) => "avail_xml",
            ProviderPayload::Properties(_) => "properties",
            ProviderPayload::TransferOffers(_) => "transfer_offers",
            ProviderPayload::Activities(_) => "activities",
        }
    }
}

pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

// Retail min-rate feed (total price for the whole stay)

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinRatesResponse {
    #[serde(alias = "data")]
    pub hotels: Vec<MinRateHotel>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinRateHotel {
    #[serde(alias = "hotelId")]
    pub id: String,
    pub name: String,
    pub hotel_description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub stars: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub category: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub review_score: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    #[serde(alias = "main_photo")]
    pub main_photo: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(alias = "facilities")]
    pub amenities: Vec<String>,
    pub minimum_rate: Option<MinimumRate>,
    #[serde(deserialize_with = "flexible_f64")]
    pub total_price: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub price: Option<f64>,
    pub available: Option<bool>,
    pub refundable: Option<bool>,
    pub cancellation_deadline: Option<String>,
    pub board_type: Option<String>,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinimumRate {
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

// City-code offers feed

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelOffersResponse {
    pub data: Vec<HotelOfferEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelOfferEntry {
    pub hotel: OfferHotel,
    pub available: Option<bool>,
    pub offers: Vec<HotelOffer>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferHotel {
    pub hotel_id: String,
    pub name: String,
    pub city_code: Option<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub rating: Option<f64>,
    pub address: Option<OfferAddress>,
    pub amenities: Vec<String>,
    pub media: Vec<OfferMedia>,
    pub description: Option<OfferText>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferAddress {
    pub lines: Vec<String>,
    pub city_name: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferMedia {
    pub uri: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferText {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelOffer {
    pub id: String,
    pub room: Option<OfferRoom>,
    pub board_type: Option<String>,
    pub price: OfferPrice,
    pub policies: Option<OfferPolicies>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferRoom {
    #[serde(rename = "type")]
    pub room_type: Option<String>,
    pub description: Option<OfferText>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferPrice {
    pub currency: Option<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub total: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub base: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferPolicies {
    pub refundable: Option<OfferRefundable>,
    pub cancellations: Vec<OfferCancellation>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferRefundable {
    pub cancellation_refund: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferCancellation {
    pub deadline: Option<String>,
}

// Own inventory (properties listed directly with us)

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertiesResponse {
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub star_rating: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub review_score: Option<f64>,
    pub review_count: Option<u32>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub base_price_per_night: Option<f64>,
    pub currency: Option<String>,
    pub cancellation_policy: Option<String>,
    pub rooms: Vec<PropertyRoom>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyRoom {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub base_price: Option<f64>,
    pub max_guests: Option<u32>,
}

// Ground transfer offers (primary transfer provider)

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferOffersResponse {
    pub data: Vec<TransferOffer>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferOffer {
    pub id: String,
    pub transfer_type: Option<String>,
    pub start: Option<TransferPoint>,
    pub vehicle: Option<TransferVehicle>,
    pub service_provider: Option<TransferServiceProvider>,
    pub quotation: Option<TransferQuotation>,
    // ISO 8601 duration, e.g. "PT1H15M"
    pub duration: Option<String>,
    pub cancellation_rules: Vec<TransferCancellationRule>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferPoint {
    pub location_code: Option<String>,
    pub date_time: Option<String>,
    pub address: Option<TransferAddress>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferAddress {
    pub line: Option<String>,
    pub city_name: Option<String>,
    pub country_code: Option<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferVehicle {
    pub code: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub seats: Vec<TransferSeat>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferSeat {
    pub count: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferServiceProvider {
    pub code: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub contacts: Option<TransferContacts>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferContacts {
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferQuotation {
    #[serde(deserialize_with = "flexible_f64")]
    pub monetary_amount: Option<f64>,
    pub currency_code: Option<String>,
    pub base: Option<TransferBase>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferBase {
    #[serde(deserialize_with = "flexible_f64")]
    pub monetary_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferCancellationRule {
    pub rule_description: Option<String>,
    #[serde(deserialize_with = "flexible_f64")]
    pub fee_value: Option<f64>,
    pub deadline: Option<String>,
}

// Generic activity/experience feed (transfer fallback)

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivitiesResponse {
    pub data: Vec<Activity>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub geo_code: Option<GeoCode>,
    #[serde(deserialize_with = "flexible_f64")]
    pub rating: Option<f64>,
    pub pictures: Vec<String>,
    pub booking_link: Option<String>,
    pub price: Option<ActivityPrice>,
    pub minimum_duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoCode {
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityPrice {
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: Option<f64>,
    pub currency_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_accepted_as_strings_or_numbers() {
        let json = r#"{
            "data": [
                {
                    "hotel": { "hotelId": "PARHT1", "name": "Hotel Lutetia", "latitude": "48.851", "longitude": 2.327, "rating": "5" },
                    "offers": [ { "id": "O1", "price": { "currency": "EUR", "total": "412.30" } } ]
                }
            ]
        }"#;
        let response: HotelOffersResponse = serde_json::from_str(json).unwrap();
        let entry = &response.data[0];
        assert_eq!(entry.hotel.latitude, Some(48.851));
        assert_eq!(entry.hotel.longitude, Some(2.327));
        assert_eq!(entry.hotel.rating, Some(5.0));
        assert_eq!(entry.offers[0].price.total, Some(412.30));
        assert_eq!(entry.offers[0].price.base, None);
    }

    #[test]
    fn test_min_rates_accepts_snake_case_photo_field() {
        let json = r#"{
            "data": [ { "hotelId": "lp1", "name": "Le Marais Inn", "main_photo": "https://img/1.jpg", "facilities": ["WiFi"] } ]
        }"#;
        let response: MinRatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.hotels[0].id, "lp1");
        assert_eq!(response.hotels[0].main_photo.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(response.hotels[0].amenities, vec!["WiFi".to_string()]);
    }
}
