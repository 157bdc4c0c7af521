// Search pipeline: normalize -> cache lookup -> fan-out -> merge -> filter/sort -> cache store

use crate::cache::{CacheGateway, CacheStore};
use crate::classifier::TransferClassifier;
use crate::config::AggregatorConfig;
use crate::criteria::{CriteriaNormalizer, GeoResolver, RawSearchRequest, SearchCriteria, SearchKind};
use crate::fallback::FallbackController;
use crate::fanout::FanOutOrchestrator;
use crate::filter::ListingFilter;
use crate::listing::{Listing, NormalizedListing, NormalizedTransfer};
use crate::merge::merge_listings;
use crate::normalize::{HotelNormalizer, TransferNormalizer};
use crate::provider::{PayloadNormalizer, ProviderOutcome, ProviderQuery, ProviderRegistry};
use crate::response::{AggregateMeta, AggregatedResult, CacheStatus, SearchResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct Aggregator {
    criteria: CriteriaNormalizer,
    registry: ProviderRegistry,
    cache: CacheGateway,
    orchestrator: FanOutOrchestrator,
    hotel_normalizer: Arc<dyn PayloadNormalizer<NormalizedListing>>,
    transfer_normalizer: Arc<dyn PayloadNormalizer<NormalizedTransfer>>,
}

impl Aggregator {
    pub fn new(
        config: &AggregatorConfig,
        resolver: Arc<dyn GeoResolver>,
        registry: ProviderRegistry,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            criteria: CriteriaNormalizer::new(resolver, config.search_defaults.clone()),
            registry,
            cache: CacheGateway::new(store, config.cache_ttl.clone()),
            orchestrator: FanOutOrchestrator::new(config.max_concurrent_providers),
            hotel_normalizer: Arc::new(HotelNormalizer),
            transfer_normalizer: Arc::new(TransferNormalizer::default()),
        }
    }

    // Replaces the built-in transfer keyword tables
    pub fn with_classifier(mut self, classifier: Arc<TransferClassifier>) -> Self {
        self.transfer_normalizer = Arc::new(TransferNormalizer::new(classifier));
        self
    }

    pub async fn search_hotels(&self, raw: &RawSearchRequest) -> SearchResponse<NormalizedListing> {
        match self.criteria.normalize(raw, SearchKind::Hotel) {
            Ok(criteria) => SearchResponse::ok(self.aggregate_hotels(&criteria).await),
            Err(e) => {
                warn!(kind = "hotel", error = %e, "Rejected search request");
                SearchResponse::invalid(&e)
            }
        }
    }

    pub async fn search_transfers(&self, raw: &RawSearchRequest) -> SearchResponse<NormalizedTransfer> {
        match self.criteria.normalize(raw, SearchKind::Transfer) {
            Ok(criteria) => SearchResponse::ok(self.aggregate_transfers(&criteria).await),
            Err(e) => {
                warn!(kind = "transfer", error = %e, "Rejected search request");
                SearchResponse::invalid(&e)
            }
        }
    }

    pub async fn aggregate_hotels(&self, criteria: &SearchCriteria) -> AggregatedResult<NormalizedListing> {
        let key = CacheGateway::compute_key(criteria, SearchKind::Hotel);
        if let Some(cached) = self.cache.lookup(&key).await {
            return cached;
        }

        let query = ProviderQuery::from_criteria(criteria, SearchKind::Hotel);
        let outcomes = self
            .orchestrator
            .run(
                self.registry.hotel_providers(),
                &query,
                Arc::clone(&self.hotel_normalizer),
            )
            .await;

        let result = assemble(SearchKind::Hotel, criteria, outcomes, false);
        self.cache.store(&key, &result).await;
        result
    }

    pub async fn aggregate_transfers(&self, criteria: &SearchCriteria) -> AggregatedResult<NormalizedTransfer> {
        let key = CacheGateway::compute_key(criteria, SearchKind::Transfer);
        if let Some(cached) = self.cache.lookup(&key).await {
            return cached;
        }

        let query = ProviderQuery::from_criteria(criteria, SearchKind::Transfer);
        let run = FallbackController::new(self.orchestrator)
            .run(
                self.registry.transfer_primary(),
                self.registry.transfer_fallback(),
                &query,
                Arc::clone(&self.transfer_normalizer),
            )
            .await;

        let fallback_used = run.fallback_used();
        let result = assemble(SearchKind::Transfer, criteria, run.outcomes, fallback_used);
        self.cache.store(&key, &result).await;
        result
    }
}

fn assemble<L: Listing>(
    kind: SearchKind,
    criteria: &SearchCriteria,
    outcomes: Vec<ProviderOutcome<L>>,
    fallback_used: bool,
) -> AggregatedResult<L> {
    let mut per_provider_counts = BTreeMap::new();
    let mut provider_errors = BTreeMap::new();
    let mut sources = Vec::new();
    let mut batches = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        per_provider_counts.insert(outcome.provider_id.clone(), outcome.count());
        if let Some(error) = &outcome.error {
            provider_errors.insert(outcome.provider_id.clone(), error.message.clone());
        }
        if outcome.count() > 0 {
            sources.push(outcome.provider_id.clone());
        }
        batches.push(outcome.listings);
    }

    let merged = merge_listings(batches);
    let listings = ListingFilter::new(criteria.price_filter, criteria.rating_filter).apply(merged.listings);

    info!(
        kind = %kind,
        count = listings.len(),
        before_dedup = merged.total_before_dedup,
        after_dedup = merged.total_after_dedup,
        sources = ?sources,
        fallback_used,
        "Search aggregated"
    );
    if listings.is_empty() {
        error!(
            kind = %kind,
            lat = criteria.location.lat,
            lng = criteria.location.lng,
            check_in = %criteria.date_range.start,
            providers = ?per_provider_counts.keys().collect::<Vec<_>>(),
            errors = ?provider_errors,
            "Zero results after aggregation"
        );
    }

    AggregatedResult {
        meta: AggregateMeta {
            search_kind: kind,
            count: listings.len(),
            sources,
            per_provider_counts,
            provider_errors,
            total_before_dedup: merged.total_before_dedup,
            total_after_dedup: merged.total_after_dedup,
            cache_status: CacheStatus::Miss,
            location_defaulted: criteria.location.defaulted,
            fallback_used,
        },
        listings,
    }
}
