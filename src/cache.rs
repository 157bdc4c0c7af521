// Result cache: the external store seam, an in-memory store and the gateway
// that keys, encodes and applies the TTL policy for aggregated results.

use crate::config::CacheTtlConfig;
use crate::criteria::{SearchCriteria, SearchKind};
use crate::listing::Listing;
use crate::provider::room_occupancies;
use crate::response::{AggregatedResult, CacheStatus};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Cache value encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub expired_count: AtomicUsize,
    pub eviction_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub eviction_count: usize,
}

#[derive(Debug, Clone)]
pub struct CacheStoreConfig {
    pub max_entries: usize,
}

impl Default for CacheStoreConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

struct CacheEntry {
    data: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

// Entries expire lazily on read; when full the soonest-expiring entry goes
pub struct InMemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    config: RwLock<CacheStoreConfig>,
    stats: CacheStats,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(CacheStoreConfig::default())
    }
}

impl InMemoryCacheStore {
    pub fn new(config: CacheStoreConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config: RwLock::new(config),
            stats: CacheStats::default(),
        }
    }

    pub fn fetch(&self, key: &str) -> Option<Bytes> {
        // Copy out before removing; a live map guard would deadlock the remove
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(), entry.data.clone()));

        match lookup {
            Some((false, data)) => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                Some(data)
            }
            Some((true, _)) => {
                if self.entries.remove_if(key, |_, entry| entry.is_expired()).is_some() {
                    self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
                }
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                None
            }
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                None
            }
        }
    }

    pub fn insert(&self, key: &str, data: Bytes, ttl: Duration) {
        let max_entries = self.config.read().max_entries.max(1);
        if !self.entries.contains_key(key) {
            while self.entries.len() >= max_entries {
                if !self.evict_one() {
                    break;
                }
            }
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn evict_one(&self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());

        match victim {
            Some(key) => {
                if self.entries.remove(&key).is_some() {
                    self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
                }
                true
            }
            None => false,
        }
    }

    // Drops every entry whose key starts with `prefix`, e.g. "search:hotel"
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        keys.iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count()
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let purged = before.saturating_sub(self.entries.len());
        self.stats.expired_count.fetch_add(purged, Ordering::SeqCst);
        purged
    }

    // Returns the number of entries evicted to fit the new bound
    pub fn resize(&self, max_entries: usize) -> usize {
        self.config.write().max_entries = max_entries;
        let bound = max_entries.max(1);

        let mut evicted = 0;
        while self.entries.len() > bound && self.evict_one() {
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.entries.len(),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.fetch(key))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, ttl);
        Ok(())
    }
}

// Read errors become misses and write errors are only logged
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    ttl: CacheTtlConfig,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>, ttl: CacheTtlConfig) -> Self {
        Self { store, ttl }
    }

    // Key over every priced dimension of the canonical criteria. Floats keep full
    // precision and children are keyed by the per-room occupancy sent upstream.
    // The free-text query is left out; its resolved coordinates are what matter.
    pub fn compute_key(criteria: &SearchCriteria, kind: SearchKind) -> String {
        let occupancy: Vec<String> = room_occupancies(&criteria.party)
            .iter()
            .map(|room| {
                let ages: Vec<String> = room.child_ages.iter().map(u8::to_string).collect();
                format!("{}[{}]", room.adults, ages.join(","))
            })
            .collect();

        format!(
            "search:{}:lat={}:lng={}:city={}:in={}:out={}:adults={}:occupancy={}:rooms={}:radius={}:limit={}:currency={}:nationality={}:price={}-{}:rating={}-{}",
            kind,
            criteria.location.lat,
            criteria.location.lng,
            criteria.location.city_code.as_deref().unwrap_or("-"),
            criteria.date_range.start,
            criteria.date_range.end,
            criteria.party.adults,
            occupancy.join("|"),
            criteria.party.rooms,
            criteria.radius_km,
            criteria.result_limit,
            criteria.currency,
            criteria.guest_nationality,
            bound(criteria.price_filter.min),
            bound(criteria.price_filter.max),
            bound(criteria.rating_filter.min),
            bound(criteria.rating_filter.max),
        )
    }

    pub fn ttl_for(&self, kind: SearchKind, empty: bool) -> Duration {
        match (empty, kind) {
            (true, _) => self.ttl.empty,
            (false, SearchKind::Hotel) => self.ttl.hotel,
            (false, SearchKind::Transfer) => self.ttl.transfer,
        }
    }

    pub async fn lookup<L: Listing>(&self, key: &str) -> Option<AggregatedResult<L>> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<AggregatedResult<L>>(&bytes) {
            Ok(mut result) => {
                result.meta.cache_status = CacheStatus::Hit;
                info!(key, count = result.listings.len(), "Cache hit");
                Some(result)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    // Best effort; returns whether the value was written
    pub async fn store<L: Listing>(&self, key: &str, result: &AggregatedResult<L>) -> bool {
        let ttl = self.ttl_for(result.meta.search_kind, result.is_empty());
        let encoded = match serde_json::to_vec(result) {
            Ok(encoded) => Bytes::from(encoded),
            Err(e) => {
                warn!(key, error = %CacheError::from(e), "Cache write skipped");
                return false;
            }
        };

        match self.store.set(key, encoded, ttl).await {
            Ok(()) => {
                debug!(key, ttl_secs = ttl.as_secs(), empty = result.is_empty(), "Cached result");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Cache write failed");
                false
            }
        }
    }
}

fn bound(value: Option<f64>) -> String {
    value.map_or_else(|| "*".to_string(), |v| v.to_string())
}

#[cfg(test)]
pub(crate) mod failing_store {
    use super::*;

    // Store whose backend is always down
    pub struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::failing_store::FailingStore;
    use super::*;
    use crate::criteria::fixtures::{normalizer, paris_criteria};
    use crate::criteria::RawSearchRequest;
    use crate::listing::fixtures::hotel;
    use crate::listing::NormalizedListing;
    use crate::response::AggregateMeta;
    use std::collections::BTreeMap;
    use std::thread;

    fn result(listings: Vec<NormalizedListing>) -> AggregatedResult<NormalizedListing> {
        AggregatedResult {
            meta: AggregateMeta {
                search_kind: SearchKind::Hotel,
                count: listings.len(),
                sources: vec!["liteapi".to_string()],
                per_provider_counts: BTreeMap::from([("liteapi".to_string(), listings.len())]),
                provider_errors: BTreeMap::new(),
                total_before_dedup: listings.len(),
                total_after_dedup: listings.len(),
                cache_status: CacheStatus::Miss,
                location_defaulted: false,
                fallback_used: false,
            },
            listings,
        }
    }

    #[test]
    fn test_key_ignores_cosmetic_differences() {
        let normalizer = normalizer();
        let a = RawSearchRequest::from_query_pairs(vec![
            ("lat", "48.8566"),
            ("lng", "2.3522"),
            ("checkInDate", "2026-11-10"),
            ("checkOutDate", "2026-11-13"),
            ("adults", "2"),
            ("childAges", "9,4"),
            ("rooms", "2"),
            ("currency", "eur"),
        ]);
        let b = RawSearchRequest::from_query_pairs(vec![
            ("lat", "48.85660"),
            ("lng", " 2.3522"),
            ("checkIn", "2026-11-10"),
            ("checkOut", "2026-11-13"),
            ("adults", "2"),
            ("childAges", " 9, 4"),
            ("rooms", "2"),
            ("currency", "EUR"),
        ]);

        let key_a = CacheGateway::compute_key(&normalizer.normalize(&a, SearchKind::Hotel).unwrap(), SearchKind::Hotel);
        let key_b = CacheGateway::compute_key(&normalizer.normalize(&b, SearchKind::Hotel).unwrap(), SearchKind::Hotel);
        assert_eq!(key_a, key_b);
        assert!(key_a.starts_with("search:hotel:"));
    }

    #[test]
    fn test_key_separates_priced_dimensions() {
        let base = paris_criteria();
        let base_key = CacheGateway::compute_key(&base, SearchKind::Hotel);

        let mut more_adults = base.clone();
        more_adults.party.adults = 3;
        let mut child = base.clone();
        child.party.child_ages = vec![Some(7)];
        let mut capped = base.clone();
        capped.price_filter.max = Some(200.0);

        for variant in [more_adults, child, capped] {
            assert_ne!(CacheGateway::compute_key(&variant, SearchKind::Hotel), base_key);
        }
        assert_ne!(CacheGateway::compute_key(&base, SearchKind::Transfer), base_key);
    }

    #[test]
    fn test_nearby_coordinates_get_distinct_keys() {
        let base = paris_criteria();
        let mut nudged = base.clone();
        nudged.location.lat += 0.00004;
        let mut wider = base.clone();
        wider.radius_km += 0.001;

        let base_key = CacheGateway::compute_key(&base, SearchKind::Hotel);
        assert_ne!(CacheGateway::compute_key(&nudged, SearchKind::Hotel), base_key);
        assert_ne!(CacheGateway::compute_key(&wider, SearchKind::Hotel), base_key);
    }

    #[test]
    fn test_child_order_matters_when_rooms_split_children() {
        let mut first = paris_criteria();
        first.party.adults = 2;
        first.party.rooms = 2;
        first.party.child_ages = vec![Some(4), Some(15)];
        let mut second = first.clone();
        second.party.child_ages = vec![Some(15), Some(4)];

        assert_ne!(
            CacheGateway::compute_key(&first, SearchKind::Hotel),
            CacheGateway::compute_key(&second, SearchKind::Hotel)
        );
    }

    #[test]
    fn test_expiration_and_ttl() {
        let store = InMemoryCacheStore::default();
        store.insert("long", Bytes::from_static(b"1"), Duration::from_secs(60));
        store.insert("short", Bytes::from_static(b"2"), Duration::from_millis(50));

        assert!(store.fetch("long").is_some());
        assert!(store.fetch("short").is_some());

        thread::sleep(Duration::from_millis(80));

        assert!(store.fetch("long").is_some());
        assert!(store.fetch("short").is_none());

        let stats = store.stats();
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.hit_count, 3);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.items_count, 1);
    }

    #[test]
    fn test_purge_expired_drops_only_stale_entries() {
        let store = InMemoryCacheStore::default();
        store.insert("search:hotel:a", Bytes::from_static(b"1"), Duration::from_millis(30));
        store.insert("search:hotel:b", Bytes::from_static(b"2"), Duration::from_millis(30));
        store.insert("search:transfer:c", Bytes::from_static(b"3"), Duration::from_secs(60));

        assert_eq!(store.purge_expired(), 0);
        thread::sleep(Duration::from_millis(60));

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().expired_count, 2);
        assert!(store.fetch("search:transfer:c").is_some());
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn test_full_store_evicts_soonest_expiring() {
        let store = InMemoryCacheStore::new(CacheStoreConfig { max_entries: 3 });
        store.insert("a", Bytes::from_static(b"a"), Duration::from_secs(300));
        store.insert("b", Bytes::from_static(b"b"), Duration::from_secs(30));
        store.insert("c", Bytes::from_static(b"c"), Duration::from_secs(600));
        store.insert("d", Bytes::from_static(b"d"), Duration::from_secs(900));

        assert_eq!(store.len(), 3);
        assert!(store.fetch("b").is_none());
        assert!(store.fetch("a").is_some());
        assert_eq!(store.stats().eviction_count, 1);

        // Overwriting an existing key never evicts
        store.insert("a", Bytes::from_static(b"a2"), Duration::from_secs(300));
        assert_eq!(store.stats().eviction_count, 1);
        assert_eq!(store.fetch("a").unwrap(), Bytes::from_static(b"a2"));
    }

    #[test]
    fn test_invalidate_prefix_and_resize() {
        let store = InMemoryCacheStore::default();
        for i in 0..4 {
            store.insert(&format!("search:hotel:{}", i), Bytes::from_static(b"h"), Duration::from_secs(60 + i));
            store.insert(&format!("search:transfer:{}", i), Bytes::from_static(b"t"), Duration::from_secs(600 + i));
        }

        assert_eq!(store.invalidate_prefix("search:hotel"), 4);
        assert_eq!(store.len(), 4);
        assert!(store.fetch("search:transfer:0").is_some());

        assert_eq!(store.resize(2), 2);
        assert_eq!(store.len(), 2);
        // The two latest-expiring entries survive
        assert!(store.fetch("search:transfer:3").is_some());
        assert!(store.fetch("search:transfer:2").is_some());
    }

    #[test]
    fn test_concurrent_access_with_contention() {
        let store = Arc::new(InMemoryCacheStore::new(CacheStoreConfig { max_entries: 50 }));
        let threads_count = 8;
        let operations_per_thread = 500;

        let handles: Vec<_> = (0..threads_count)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..operations_per_thread {
                        let key = format!("search:hotel:{}", (i * 7 + j) % 80);
                        if j % 4 == 0 {
                            store.insert(&key, Bytes::from(vec![i as u8, j as u8]), Duration::from_secs(60));
                        } else {
                            let _ = store.fetch(&key);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = store.stats();
        assert!(stats.items_count <= 50);
        assert_eq!(
            stats.hit_count + stats.miss_count,
            threads_count * operations_per_thread * 3 / 4
        );
    }

    #[test]
    fn test_gateway_round_trip_marks_hit() {
        let gateway = CacheGateway::new(Arc::new(InMemoryCacheStore::default()), CacheTtlConfig::default());
        let original = result(vec![hotel("liteapi", "Hotel Roma", 41.9, 12.5, Some(80.0))]);

        tokio_test::block_on(async {
            assert!(gateway.lookup::<NormalizedListing>("k").await.is_none());
            assert!(gateway.store("k", &original).await);

            let cached = gateway.lookup::<NormalizedListing>("k").await.unwrap();
            assert_eq!(cached.meta.cache_status, CacheStatus::Hit);
            assert_eq!(cached.listings, original.listings);
        });
    }

    #[test]
    fn test_store_failures_degrade_to_miss() {
        let gateway = CacheGateway::new(Arc::new(FailingStore), CacheTtlConfig::default());
        let original = result(vec![]);

        tokio_test::block_on(async {
            assert!(!gateway.store("k", &original).await);
            assert!(gateway.lookup::<NormalizedListing>("k").await.is_none());
        });
    }

    #[test]
    fn test_undecodable_entry_is_a_miss() {
        let store = Arc::new(InMemoryCacheStore::default());
        store.insert("k", Bytes::from_static(b"not json"), Duration::from_secs(60));
        let gateway = CacheGateway::new(store, CacheTtlConfig::default());

        let cached = tokio_test::block_on(gateway.lookup::<NormalizedListing>("k"));
        assert!(cached.is_none());
    }

    #[test]
    fn test_ttl_policy() {
        let gateway = CacheGateway::new(Arc::new(InMemoryCacheStore::default()), CacheTtlConfig::default());
        assert_eq!(gateway.ttl_for(SearchKind::Hotel, false), Duration::from_secs(900));
        assert_eq!(gateway.ttl_for(SearchKind::Transfer, false), Duration::from_secs(1800));
        assert_eq!(gateway.ttl_for(SearchKind::Hotel, true), Duration::from_secs(300));
        assert_eq!(gateway.ttl_for(SearchKind::Transfer, true), Duration::from_secs(300));
    }
}
