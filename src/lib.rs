// Travel inventory aggregator: hotel and ground-transfer search across upstream providers

pub mod cache;
pub mod classifier;
pub mod config;
pub mod criteria;
pub mod fallback;
pub mod fanout;
pub mod filter;
pub mod http_provider;
pub mod listing;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod pricing;
pub mod provider;
pub mod response;
pub mod supplier;
pub mod xml_response;

// Re-export key types for convenience
pub use cache::{CacheError, CacheGateway, CacheStatsReport, CacheStore, CacheStoreConfig, InMemoryCacheStore};
pub use classifier::TransferClassifier;
pub use config::{AggregatorConfig, CacheTtlConfig, ConfigError, ProviderSettings, SearchDefaults};
pub use criteria::{
    CityRecord, CityTable, CriteriaNormalizer, GeoResolver, RawSearchRequest, SearchCriteria, SearchKind,
    ValidationError,
};
pub use fallback::{FallbackController, FallbackState};
pub use fanout::FanOutOrchestrator;
pub use filter::ListingFilter;
pub use http_provider::{build_registry, HttpProvider, HttpProviderConfig, PayloadFormat, ProviderRole};
pub use listing::{DedupKey, Listing, NormalizedListing, NormalizedTransfer, TransferType};
pub use merge::{merge_listings, MergeOutcome};
pub use normalize::{HotelNormalizer, TransferNormalizer};
pub use pipeline::Aggregator;
pub use pricing::{apply_markup, MarkedUpPrice, FLOOR_FEE, MARKUP_RATE};
pub use provider::{
    InventoryProvider, PayloadNormalizer, ProviderError, ProviderOutcome, ProviderQuery, ProviderRegistry,
};
pub use response::{AggregateMeta, AggregatedResult, CacheStatus, SearchResponse};
pub use supplier::ProviderPayload;
