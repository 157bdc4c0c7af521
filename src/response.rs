// Aggregated result, its metadata and the external response envelope

use crate::criteria::{SearchKind, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const CACHE_STATUS_HEADER: &str = "X-Cache-Status";
pub const SOURCES_HEADER: &str = "X-API-Sources";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStatus::Hit => f.write_str("HIT"),
            CacheStatus::Miss => f.write_str("MISS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMeta {
    pub search_kind: SearchKind,
    pub count: usize,
    // Providers that contributed at least one listing, in priority order
    pub sources: Vec<String>,
    // Normalized listings per queried provider, before dedup
    pub per_provider_counts: BTreeMap<String, usize>,
    pub provider_errors: BTreeMap<String, String>,
    pub total_before_dedup: usize,
    pub total_after_dedup: usize,
    pub cache_status: CacheStatus,
    pub location_defaulted: bool,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult<L> {
    pub listings: Vec<L>,
    pub meta: AggregateMeta,
}

impl<L> AggregatedResult<L> {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResponse<L> {
    Success {
        success: bool,
        data: Vec<L>,
        meta: AggregateMeta,
    },
    Failure {
        success: bool,
        error: String,
        hint: String,
    },
}

impl<L: Serialize> SearchResponse<L> {
    pub fn ok(result: AggregatedResult<L>) -> Self {
        SearchResponse::Success {
            success: true,
            data: result.listings,
            meta: result.meta,
        }
    }

    pub fn invalid(error: &ValidationError) -> Self {
        SearchResponse::Failure {
            success: false,
            error: error.to_string(),
            hint: error.hint().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchResponse::Success { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            SearchResponse::Success { .. } => 200,
            SearchResponse::Failure { .. } => 400,
        }
    }

    pub fn data(&self) -> &[L] {
        match self {
            SearchResponse::Success { data, .. } => data,
            SearchResponse::Failure { .. } => &[],
        }
    }

    pub fn meta(&self) -> Option<&AggregateMeta> {
        match self {
            SearchResponse::Success { meta, .. } => Some(meta),
            SearchResponse::Failure { .. } => None,
        }
    }

    // Diagnostics headers; validation failures carry none
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self.meta() {
            Some(meta) => vec![
                (CACHE_STATUS_HEADER, meta.cache_status.to_string()),
                (SOURCES_HEADER, meta.sources.join(",")),
            ],
            None => Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
