// Aggregator configuration: search defaults, provider settings and cache TTL policy

use anyhow::Context;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

// Location substituted when a free-text location does not resolve
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultLocation {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
    pub country_code: String,
    pub city_code: Option<String>,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            label: "New York".to_string(),
            lat: 40.7128,
            lng: -74.0060,
            country_code: "US".to_string(),
            city_code: Some("NYC".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchDefaults {
    pub radius_km: f64,
    pub limit: u32,
    pub rooms: u32,
    pub currency: String,
    pub nationality: String,
    pub location: DefaultLocation,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            limit: 30,
            rooms: 1,
            currency: "USD".to_string(),
            nationality: "US".to_string(),
            location: DefaultLocation::default(),
        }
    }
}

// Per-provider deployment settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub timeout_ms: u64,
    pub enabled: bool,
    pub credentials_present: bool,
}

impl ProviderSettings {
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            enabled: true,
            credentials_present: true,
        }
    }
}

// TTL policy for aggregated results
#[derive(Debug, Clone, PartialEq)]
pub struct CacheTtlConfig {
    pub hotel: Duration,
    pub transfer: Duration,
    // Applied to empty results (negative caching)
    pub empty: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            hotel: Duration::from_secs(900),
            transfer: Duration::from_secs(1800),
            empty: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub max_concurrent_providers: usize,
    pub cache_ttl: CacheTtlConfig,
    pub search_defaults: SearchDefaults,
    pub providers: HashMap<String, ProviderSettings>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        let providers = [
            ("liteapi", 8_000),
            ("amadeus", 12_000),
            ("xmlfeed", 15_000),
            ("native", 5_000),
            ("transfers", 25_000),
            ("activities", 15_000),
        ]
        .into_iter()
        .map(|(id, timeout_ms)| (id.to_string(), ProviderSettings::with_timeout_ms(timeout_ms)))
        .collect();

        Self {
            max_concurrent_providers: 8,
            cache_ttl: CacheTtlConfig::default(),
            search_defaults: SearchDefaults::default(),
            providers,
        }
    }
}

impl AggregatorConfig {
    // Settings for a provider; unknown providers get the defaults
    pub fn provider(&self, id: &str) -> ProviderSettings {
        self.providers.get(id).cloned().unwrap_or_default()
    }

    // Reads AGGREGATOR_* variables on top of the defaults. Per-provider keys use
    // the upper-cased id, e.g. AGGREGATOR_PROVIDER_LITEAPI_TIMEOUT_MS
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("AGGREGATOR_MAX_CONCURRENT_PROVIDERS") {
            config.max_concurrent_providers =
                parse_var("AGGREGATOR_MAX_CONCURRENT_PROVIDERS", &value)?;
        }
        if let Some(value) = lookup("AGGREGATOR_HOTEL_TTL_SECS") {
            config.cache_ttl.hotel =
                Duration::from_secs(parse_var("AGGREGATOR_HOTEL_TTL_SECS", &value)?);
        }
        if let Some(value) = lookup("AGGREGATOR_TRANSFER_TTL_SECS") {
            config.cache_ttl.transfer =
                Duration::from_secs(parse_var("AGGREGATOR_TRANSFER_TTL_SECS", &value)?);
        }
        if let Some(value) = lookup("AGGREGATOR_EMPTY_TTL_SECS") {
            config.cache_ttl.empty =
                Duration::from_secs(parse_var("AGGREGATOR_EMPTY_TTL_SECS", &value)?);
        }
        if let Some(value) = lookup("AGGREGATOR_DEFAULT_CURRENCY") {
            config.search_defaults.currency = value.trim().to_uppercase();
        }
        if let Some(value) = lookup("AGGREGATOR_DEFAULT_RADIUS_KM") {
            config.search_defaults.radius_km = parse_var("AGGREGATOR_DEFAULT_RADIUS_KM", &value)?;
        }
        if let Some(value) = lookup("AGGREGATOR_DEFAULT_LIMIT") {
            config.search_defaults.limit = parse_var("AGGREGATOR_DEFAULT_LIMIT", &value)?;
        }

        for (id, settings) in config.providers.iter_mut() {
            let prefix = format!("AGGREGATOR_PROVIDER_{}", id.to_uppercase());

            let var = format!("{}_TIMEOUT_MS", prefix);
            if let Some(value) = lookup(&var) {
                settings.timeout_ms = parse_var(&var, &value)?;
            }
            let var = format!("{}_ENABLED", prefix);
            if let Some(value) = lookup(&var) {
                settings.enabled = parse_flag(&var, &value)?;
            }
            // An absent key counts as missing credentials
            let var = format!("{}_API_KEY", prefix);
            settings.credentials_present = lookup(&var).map_or(false, |value| !value.trim().is_empty());
        }

        Ok(config)
    }
}

fn parse_var<T>(var: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            reason: e.to_string(),
        })
        .with_context(|| format!("reading {} from environment", var))
}

fn parse_flag(var: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{}\"", other),
        })
        .with_context(|| format!("reading {} from environment", var)),
    }
}
