// HTTP adapter for upstream inventory providers and registry bootstrap

use crate::config::AggregatorConfig;
use crate::provider::{InventoryProvider, ProviderError, ProviderQuery, ProviderRegistry};
use crate::supplier::{
    ActivitiesResponse, HotelOffersResponse, MinRatesResponse, PropertiesResponse, PropertyRecord,
    ProviderPayload, TransferOffersResponse,
};
use crate::xml_response::decode_avail_xml;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "X-API-Key";
const MAX_ERROR_BODY_CHARS: usize = 200;

// Wire format of a provider's response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    MinRatesJson,
    HotelOffersJson,
    AvailXml,
    PropertiesJson,
    TransferOffersJson,
    ActivitiesJson,
}

impl PayloadFormat {
    pub fn decode(&self, body: &[u8]) -> Result<ProviderPayload, ProviderError> {
        match self {
            PayloadFormat::MinRatesJson => decode_json::<MinRatesResponse>(body).map(ProviderPayload::MinRates),
            PayloadFormat::HotelOffersJson => {
                decode_json::<HotelOffersResponse>(body).map(ProviderPayload::HotelOffers)
            }
            PayloadFormat::AvailXml => {
                let text = std::str::from_utf8(body)
                    .map_err(|e| ProviderError::MalformedPayload(format!("XML body is not UTF-8: {}", e)))?;
                decode_avail_xml(text)
                    .map(ProviderPayload::AvailXml)
                    .map_err(|e| ProviderError::MalformedPayload(format!("XML parsing error: {}", e)))
            }
            // Own inventory is served either bare or wrapped in `properties`
            PayloadFormat::PropertiesJson => match serde_json::from_slice::<Vec<PropertyRecord>>(body) {
                Ok(properties) => Ok(ProviderPayload::Properties(PropertiesResponse { properties })),
                Err(_) => decode_json::<PropertiesResponse>(body).map(ProviderPayload::Properties),
            },
            PayloadFormat::TransferOffersJson => {
                decode_json::<TransferOffersResponse>(body).map(ProviderPayload::TransferOffers)
            }
            PayloadFormat::ActivitiesJson => {
                decode_json::<ActivitiesResponse>(body).map(ProviderPayload::Activities)
            }
        }
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|e| ProviderError::MalformedPayload(format!("JSON parsing error: {}", e)))
}

// Where a provider sits in the search pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderRole {
    Hotel,
    TransferPrimary,
    TransferFallback,
}

#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub id: String,
    pub endpoint: String,
    pub api_key: String,
    pub format: PayloadFormat,
    pub role: ProviderRole,
    // City-code feeds cannot search by coordinates alone
    pub require_city_code: bool,
}

// POSTs the provider query as JSON and decodes the body per PayloadFormat.
// Timeouts are applied by the fan-out, not by the HTTP client.
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("travel_aggregator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Other(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { config, client })
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Bytes, ProviderError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(query)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status_code: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))
    }
}

#[async_trait]
impl InventoryProvider for HttpProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn accepts(&self, query: &ProviderQuery) -> bool {
        !self.config.require_city_code || query.city_code.is_some()
    }

    async fn search(&self, query: &ProviderQuery) -> Result<ProviderPayload, ProviderError> {
        let body = self.fetch(query).await?;
        debug!(provider = %self.config.id, bytes = body.len(), "Provider body received");
        self.config.format.decode(&body)
    }
}

// Registers definitions in the given order. Providers with a blank api key, or
// disabled or uncredentialed in config, are left out.
pub fn build_registry(
    config: &AggregatorConfig,
    providers: Vec<HttpProviderConfig>,
) -> anyhow::Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new(config);

    for provider_config in providers {
        let id = provider_config.id.clone();
        if provider_config.api_key.trim().is_empty() {
            warn!(provider = %id, "Provider API key missing, not registered");
            continue;
        }
        let role = provider_config.role;
        let provider = HttpProvider::new(provider_config)
            .with_context(|| format!("failed to build HTTP provider {}", id))?;
        let provider: Arc<dyn InventoryProvider> = Arc::new(provider);

        let registered = match role {
            ProviderRole::Hotel => registry.register_hotel(provider),
            ProviderRole::TransferPrimary => registry.register_transfer_primary(provider),
            ProviderRole::TransferFallback => registry.register_transfer_fallback(provider),
        };
        if registered {
            info!(provider = %id, role = ?role, "Provider registered");
        }
    }

    Ok(registry)
}
