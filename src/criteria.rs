// Criteria normalization: raw request fields (rich or legacy vocabulary) into canonical SearchCriteria

use crate::config::SearchDefaults;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

// The only errors that fail a search request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: location")]
    MissingLocation,

    #[error("Missing required parameter: {0}")]
    MissingDate(&'static str),

    #[error("Missing required parameter: guests.adults")]
    MissingAdults,
}

impl ValidationError {
    pub fn hint(&self) -> &'static str {
        match self {
            ValidationError::MissingLocation => {
                "Provide either { lat, lng } coordinates or { query: \"city name\" }"
            }
            ValidationError::MissingDate(_) => "Provide dates in YYYY-MM-DD format",
            ValidationError::MissingAdults => "Provide { guests: { adults: number } }",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Hotel,
    Transfer,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Hotel => "hotel",
            SearchKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub lat: f64,
    pub lng: f64,
    pub country_code: String,
    pub city_code: Option<String>,
}

// Pure lookup from free text to coordinates
pub trait GeoResolver: Send + Sync {
    fn resolve_location(&self, text: &str) -> Option<ResolvedLocation>;
}

#[derive(Debug, Clone)]
pub struct CityRecord {
    pub name: String,
    pub aliases: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub country_code: String,
    pub city_code: Option<String>,
}

// Exact match on folded name or alias first, then containment either way for
// queries of four or more characters
pub struct CityTable {
    records: Vec<CityRecord>,
    index: HashMap<String, usize>,
}

impl CityTable {
    pub fn new(records: Vec<CityRecord>) -> Self {
        let mut index = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            index.entry(fold_text(&record.name)).or_insert(position);
            for alias in &record.aliases {
                index.entry(fold_text(alias)).or_insert(position);
            }
            if let Some(code) = &record.city_code {
                index.entry(fold_text(code)).or_insert(position);
            }
        }
        Self { records, index }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn to_resolved(record: &CityRecord) -> ResolvedLocation {
        ResolvedLocation {
            lat: record.lat,
            lng: record.lng,
            country_code: record.country_code.clone(),
            city_code: record.city_code.clone(),
        }
    }
}

impl GeoResolver for CityTable {
    fn resolve_location(&self, text: &str) -> Option<ResolvedLocation> {
        let folded = fold_text(text);
        if folded.is_empty() {
            return None;
        }

        if let Some(position) = self.index.get(&folded) {
            return Some(Self::to_resolved(&self.records[*position]));
        }

        if folded.chars().count() < 4 {
            return None;
        }

        self.records
            .iter()
            .find(|record| {
                let name = fold_text(&record.name);
                name.contains(&folded) || folded.contains(&name)
            })
            .map(Self::to_resolved)
    }
}

// Lowercase, trim and strip the common Latin accents
fn fold_text(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawLocation {
    #[serde(deserialize_with = "lenient_f64", alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", alias = "longitude", alias = "lon")]
    pub lng: Option<f64>,
    #[serde(alias = "name", alias = "city")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum RawChildren {
    Count(u32),
    Ages(Vec<Option<u8>>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGuests {
    #[serde(deserialize_with = "lenient_u32")]
    pub adults: Option<u32>,
    #[serde(deserialize_with = "lenient_children")]
    pub children: Option<RawChildren>,
}

// Accepts the rich body vocabulary and the legacy flat one at the same time
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSearchRequest {
    pub location: Option<RawLocation>,
    #[serde(alias = "cityCode", alias = "city", alias = "destination")]
    pub query: Option<String>,
    #[serde(deserialize_with = "lenient_f64", alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", alias = "longitude", alias = "lon")]
    pub lng: Option<f64>,
    #[serde(alias = "checkInDate", alias = "startDate", alias = "date")]
    pub check_in: Option<String>,
    #[serde(alias = "checkOutDate", alias = "endDate")]
    pub check_out: Option<String>,
    pub guests: Option<RawGuests>,
    #[serde(deserialize_with = "lenient_u32", alias = "passengers")]
    pub adults: Option<u32>,
    #[serde(deserialize_with = "lenient_children")]
    pub children: Option<RawChildren>,
    #[serde(deserialize_with = "lenient_ages")]
    pub child_ages: Option<Vec<u8>>,
    #[serde(deserialize_with = "lenient_u32", alias = "roomQuantity")]
    pub rooms: Option<u32>,
    #[serde(deserialize_with = "lenient_f64")]
    pub radius: Option<f64>,
    #[serde(deserialize_with = "lenient_u32")]
    pub limit: Option<u32>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub min_price: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub max_price: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub min_rating: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub max_rating: Option<f64>,
}

impl RawSearchRequest {
    // Builds a raw request from URL query pairs (legacy GET vocabulary)
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = serde_json::Map::new();
        for (key, value) in pairs {
            let key: String = key.into();
            // First synonym wins so aliases never collide during decoding
            map.entry(canonical_query_key(&key).to_string())
                .or_insert_with(|| Value::String(value.into()));
        }
        match serde_json::from_value(Value::Object(map.clone())) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Query pairs did not decode, dropping the offending pairs");
                let mut kept = serde_json::Map::new();
                for (key, value) in map {
                    kept.insert(key.clone(), value);
                    if serde_json::from_value::<Self>(Value::Object(kept.clone())).is_err() {
                        debug!(key = %key, "Dropped undecodable query pair");
                        kept.remove(&key);
                    }
                }
                serde_json::from_value(Value::Object(kept)).unwrap_or_default()
            }
        }
    }
}

fn canonical_query_key(key: &str) -> &str {
    match key {
        "cityCode" | "city" | "destination" => "query",
        "latitude" => "lat",
        "longitude" | "lon" => "lng",
        "checkInDate" | "startDate" | "date" => "checkIn",
        "checkOutDate" | "endDate" => "checkOut",
        "passengers" => "adults",
        "roomQuantity" => "rooms",
        other => other,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn whole_from_value(value: &Value) -> Option<u32> {
    number_from_value(value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

fn age_from_value(value: &Value) -> Option<u8> {
    whole_from_value(value).filter(|age| *age <= 17).map(|age| age as u8)
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(whole_from_value))
}

fn lenient_children<'de, D>(deserializer: D) -> Result<Option<RawChildren>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(RawChildren::Ages(
            items.iter().map(age_from_value).collect(),
        )),
        Some(Value::String(s)) if s.contains(',') => Some(RawChildren::Ages(
            s.split(',')
                .map(|part| age_from_value(&Value::String(part.to_string())))
                .collect(),
        )),
        Some(other) => whole_from_value(&other).map(RawChildren::Count),
        None => None,
    })
}

// Invalid entries are dropped rather than kept as unknown ages
fn lenient_ages<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let ages: Vec<u8> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(age_from_value).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .filter_map(|part| age_from_value(&Value::String(part.to_string())))
            .collect(),
        Some(other) => age_from_value(&other).into_iter().collect(),
        None => return Ok(None),
    };
    Ok(Some(ages))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaLocation {
    pub lat: f64,
    pub lng: f64,
    pub country_code: Option<String>,
    pub city_code: Option<String>,
    pub query_text: Option<String>,
    // True when the free-text location did not resolve and the default was used
    pub defaulted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn nights(&self) -> u32 {
        (self.end - self.start).num_days().max(1) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub adults: u32,
    // One entry per child; None when the age was not given
    pub child_ages: Vec<Option<u8>>,
    pub rooms: u32,
}

impl Party {
    pub fn children(&self) -> u32 {
        self.child_ages.len() as u32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RangeFilter {
    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub location: CriteriaLocation,
    pub date_range: DateRange,
    pub party: Party,
    pub radius_km: f64,
    pub result_limit: u32,
    pub currency: String,
    pub guest_nationality: String,
    pub price_filter: RangeFilter,
    pub rating_filter: RangeFilter,
}

pub struct CriteriaNormalizer {
    resolver: Arc<dyn GeoResolver>,
    defaults: SearchDefaults,
}

impl CriteriaNormalizer {
    pub fn new(resolver: Arc<dyn GeoResolver>, defaults: SearchDefaults) -> Self {
        Self { resolver, defaults }
    }

    pub fn normalize(
        &self,
        raw: &RawSearchRequest,
        kind: SearchKind,
    ) -> Result<SearchCriteria, ValidationError> {
        let raw_location = raw.location.clone().unwrap_or_default();
        let lat = raw_location.lat.or(raw.lat);
        let lng = raw_location.lng.or(raw.lng);
        let query = non_empty(raw_location.query.as_deref()).or(non_empty(raw.query.as_deref()));

        let coordinates = match (lat, lng) {
            (Some(lat), Some(lng)) if valid_coordinates(lat, lng) => Some((lat, lng)),
            _ => None,
        };
        if coordinates.is_none() && query.is_none() {
            return Err(ValidationError::MissingLocation);
        }

        let start = raw
            .check_in
            .as_deref()
            .and_then(parse_date)
            .ok_or(ValidationError::MissingDate("checkIn"))?;
        let end = match (raw.check_out.as_deref().and_then(parse_date), kind) {
            (Some(end), _) => end,
            (None, SearchKind::Transfer) => start,
            (None, SearchKind::Hotel) => return Err(ValidationError::MissingDate("checkOut")),
        };

        let guests = raw.guests.clone().unwrap_or_default();
        let adults = guests
            .adults
            .or(raw.adults)
            .filter(|adults| *adults > 0)
            .ok_or(ValidationError::MissingAdults)?;

        let location = self.resolve(coordinates, query);
        let child_ages = merge_children(guests.children.or_else(|| raw.children.clone()), raw.child_ages.as_deref());

        let country_code = location.country_code.clone();
        let criteria = SearchCriteria {
            location,
            date_range: DateRange { start, end },
            party: Party {
                adults,
                child_ages,
                rooms: raw.rooms.filter(|r| *r > 0).unwrap_or(self.defaults.rooms),
            },
            radius_km: raw
                .radius
                .filter(|r| *r > 0.0)
                .unwrap_or(self.defaults.radius_km),
            result_limit: raw.limit.filter(|l| *l > 0).unwrap_or(self.defaults.limit),
            currency: normalize_currency(raw.currency.as_deref())
                .unwrap_or_else(|| self.defaults.currency.clone()),
            guest_nationality: country_code.unwrap_or_else(|| self.defaults.nationality.clone()),
            price_filter: RangeFilter {
                min: non_negative(raw.min_price),
                max: non_negative(raw.max_price),
            },
            rating_filter: RangeFilter {
                min: non_negative(raw.min_rating),
                max: non_negative(raw.max_rating),
            },
        };

        debug!(
            kind = %kind,
            lat = criteria.location.lat,
            lng = criteria.location.lng,
            adults = criteria.party.adults,
            children = criteria.party.children(),
            rooms = criteria.party.rooms,
            "Normalized search criteria"
        );
        Ok(criteria)
    }

    fn resolve(&self, coordinates: Option<(f64, f64)>, query: Option<String>) -> CriteriaLocation {
        let resolved = query
            .as_deref()
            .and_then(|text| self.resolver.resolve_location(text));

        match (coordinates, resolved) {
            (Some((lat, lng)), resolved) => CriteriaLocation {
                lat,
                lng,
                country_code: resolved.as_ref().map(|r| r.country_code.clone()),
                city_code: resolved.and_then(|r| r.city_code),
                query_text: query,
                defaulted: false,
            },
            (None, Some(resolved)) => CriteriaLocation {
                lat: resolved.lat,
                lng: resolved.lng,
                country_code: Some(resolved.country_code),
                city_code: resolved.city_code,
                query_text: query,
                defaulted: false,
            },
            (None, None) => {
                let fallback = &self.defaults.location;
                warn!(
                    query = query.as_deref().unwrap_or_default(),
                    lat = fallback.lat,
                    lng = fallback.lng,
                    "Location did not resolve, using default location"
                );
                CriteriaLocation {
                    lat: fallback.lat,
                    lng: fallback.lng,
                    country_code: Some(fallback.country_code.clone()),
                    city_code: fallback.city_code.clone(),
                    query_text: query,
                    defaulted: true,
                }
            }
        }
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn valid_coordinates(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

// Accepts YYYY-MM-DD or an ISO datetime starting with one
fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| text.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn normalize_currency(text: Option<&str>) -> Option<String> {
    text.map(|t| t.trim().to_uppercase())
        .filter(|t| t.len() == 3 && t.chars().all(|c| c.is_ascii_alphabetic()))
}

fn merge_children(children: Option<RawChildren>, child_ages: Option<&[u8]>) -> Vec<Option<u8>> {
    let (count, mut ages): (usize, Vec<Option<u8>>) = match children {
        Some(RawChildren::Ages(ages)) => (ages.len(), ages),
        Some(RawChildren::Count(count)) => (count as usize, Vec::new()),
        None => (0, Vec::new()),
    };

    if ages.iter().all(Option::is_none) {
        if let Some(explicit) = child_ages {
            ages = explicit.iter().copied().map(Some).collect();
        }
    }

    let total = count.max(ages.len());
    ages.resize(total, None);
    ages
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawSearchRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coordinates_used_verbatim() {
        let criteria = normalizer()
            .normalize(
                &raw(json!({
                    "location": { "lat": 41.39, "lng": 2.17 },
                    "checkIn": "2026-11-10",
                    "checkOut": "2026-11-12",
                    "guests": { "adults": 2 }
                })),
                SearchKind::Hotel,
            )
            .unwrap();

        assert_eq!(criteria.location.lat, 41.39);
        assert_eq!(criteria.location.lng, 2.17);
        assert!(!criteria.location.defaulted);
        assert_eq!(criteria.guest_nationality, "US");
        assert_eq!(criteria.date_range.nights(), 2);
    }

    #[test]
    fn test_query_resolves_through_table() {
        let criteria = paris_criteria();
        assert_eq!(criteria.location.lat, 48.8566);
        assert_eq!(criteria.location.country_code.as_deref(), Some("FR"));
        assert_eq!(criteria.location.city_code.as_deref(), Some("PAR"));
        assert_eq!(criteria.guest_nationality, "FR");
    }

    #[test]
    fn test_unresolved_query_falls_back_to_default_location() {
        let criteria = normalizer()
            .normalize(
                &raw(json!({
                    "query": "Atlantis",
                    "checkIn": "2026-11-10",
                    "checkOut": "2026-11-12",
                    "adults": 1
                })),
                SearchKind::Hotel,
            )
            .unwrap();

        let defaults = SearchDefaults::default();
        assert!(criteria.location.defaulted);
        assert_eq!(criteria.location.lat, defaults.location.lat);
        assert_eq!(criteria.location.lng, defaults.location.lng);
        assert_eq!(criteria.location.query_text.as_deref(), Some("Atlantis"));
    }

    #[test]
    fn test_resolver_matches_aliases_accents_and_partials() {
        let table = city_table();
        assert_eq!(table.resolve_location("NYC").unwrap().country_code, "US");
        assert_eq!(table.resolve_location("sao paulo").unwrap().country_code, "BR");
        assert_eq!(table.resolve_location("Paris, France").unwrap().country_code, "FR");
        assert_eq!(table.resolve_location("PAR").unwrap().country_code, "FR");
        // Short queries only match exactly
        assert!(table.resolve_location("pa").is_none());
    }

    #[test]
    fn test_legacy_and_rich_vocabularies_normalize_identically() {
        let rich = raw(json!({
            "location": { "query": "Paris" },
            "checkIn": "2026-11-10",
            "checkOut": "2026-11-13",
            "guests": { "adults": 2, "children": [4, 9] },
            "rooms": 1,
            "currency": "eur"
        }));
        let legacy = RawSearchRequest::from_query_pairs(vec![
            ("cityCode", "paris"),
            ("checkInDate", "2026-11-10"),
            ("checkOutDate", "2026-11-13"),
            ("adults", "2"),
            ("children", "2"),
            ("childAges", "4,9"),
            ("currency", "EUR"),
        ]);

        let normalizer = normalizer();
        let mut from_rich = normalizer.normalize(&rich, SearchKind::Hotel).unwrap();
        let mut from_legacy = normalizer.normalize(&legacy, SearchKind::Hotel).unwrap();
        // The echoed query text is cosmetic
        from_rich.location.query_text = None;
        from_legacy.location.query_text = None;
        assert_eq!(from_rich, from_legacy);
        assert_eq!(from_rich.party.child_ages, vec![Some(4), Some(9)]);
        assert_eq!(from_rich.currency, "EUR");
    }

    #[test]
    fn test_defensive_numeric_parsing_uses_defaults() {
        let criteria = normalizer()
            .normalize(
                &raw(json!({
                    "lat": "40.7",
                    "lng": "-74.0",
                    "checkIn": "2026-11-10",
                    "checkOut": "2026-11-11",
                    "adults": "2",
                    "rooms": "lots",
                    "radius": null,
                    "limit": "abc",
                    "minPrice": "-10"
                })),
                SearchKind::Hotel,
            )
            .unwrap();

        assert_eq!(criteria.location.lat, 40.7);
        assert_eq!(criteria.party.rooms, 1);
        assert_eq!(criteria.radius_km, 5.0);
        assert_eq!(criteria.result_limit, 30);
        assert_eq!(criteria.party.children(), 0);
        assert_eq!(criteria.price_filter.min, None);
        assert_eq!(criteria.currency, "USD");
    }

    #[test]
    fn test_child_ages_are_filtered_and_padded() {
        let legacy = RawSearchRequest::from_query_pairs(vec![
            ("lat", "40.7"),
            ("lng", "-74.0"),
            ("checkIn", "2026-11-10"),
            ("checkOut", "2026-11-11"),
            ("adults", "2"),
            ("children", "3"),
            ("childAges", "2, 25, x, 8"),
        ]);
        let criteria = normalizer().normalize(&legacy, SearchKind::Hotel).unwrap();
        assert_eq!(criteria.party.child_ages, vec![Some(2), Some(8), None]);
    }

    #[test]
    fn test_missing_required_fields_fail_fast() {
        let normalizer = normalizer();
        let no_location = raw(json!({ "checkIn": "2026-11-10", "checkOut": "2026-11-11", "adults": 1 }));
        assert_eq!(
            normalizer.normalize(&no_location, SearchKind::Hotel),
            Err(ValidationError::MissingLocation)
        );

        let no_dates = raw(json!({ "query": "Paris", "adults": 1 }));
        assert_eq!(
            normalizer.normalize(&no_dates, SearchKind::Hotel),
            Err(ValidationError::MissingDate("checkIn"))
        );

        let no_checkout = raw(json!({ "query": "Paris", "checkIn": "2026-11-10", "adults": 1 }));
        assert_eq!(
            normalizer.normalize(&no_checkout, SearchKind::Hotel),
            Err(ValidationError::MissingDate("checkOut"))
        );

        let no_adults = raw(json!({ "query": "Paris", "checkIn": "2026-11-10", "checkOut": "2026-11-11" }));
        assert_eq!(
            normalizer.normalize(&no_adults, SearchKind::Hotel),
            Err(ValidationError::MissingAdults)
        );
    }

    #[test]
    fn test_undecodable_pair_does_not_discard_the_request() {
        let legacy = RawSearchRequest::from_query_pairs(vec![
            ("query", "Paris"),
            ("guests", "2"),
            ("checkInDate", "2026-11-10"),
            ("checkOutDate", "2026-11-13"),
            ("adults", "2"),
        ]);
        assert_eq!(legacy.query.as_deref(), Some("Paris"));
        assert_eq!(legacy.guests, None);

        let criteria = normalizer().normalize(&legacy, SearchKind::Hotel).unwrap();
        assert_eq!(criteria.location.city_code.as_deref(), Some("PAR"));
        assert_eq!(criteria.party.adults, 2);
    }

    #[test]
    fn test_transfer_end_date_defaults_to_start() {
        let criteria = normalizer()
            .normalize(
                &raw(json!({ "query": "NYC", "date": "2026-11-10T09:30:00", "passengers": 3 })),
                SearchKind::Transfer,
            )
            .unwrap();
        assert_eq!(criteria.date_range.start, criteria.date_range.end);
        assert_eq!(criteria.party.adults, 3);
    }
}
