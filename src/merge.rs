// Merge and deduplication of listings from every provider

use crate::listing::{DedupKey, Listing};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<L> {
    pub listings: Vec<L>,
    pub total_before_dedup: usize,
    pub total_after_dedup: usize,
}

// First seen wins unless a strictly cheaper one follows; absent prices compare
// as +infinity. Output keeps first-occurrence order.
pub fn merge_listings<L, I>(batches: I) -> MergeOutcome<L>
where
    L: Listing,
    I: IntoIterator<Item = Vec<L>>,
{
    let mut kept: Vec<L> = Vec::new();
    let mut positions: HashMap<DedupKey, usize> = HashMap::new();
    let mut total_before_dedup = 0;

    for listing in batches.into_iter().flatten() {
        total_before_dedup += 1;
        let key = listing.dedup_key();
        match positions.get(&key) {
            Some(&position) => {
                if listing.effective_price() < kept[position].effective_price() {
                    kept[position] = listing;
                }
            }
            None => {
                positions.insert(key, kept.len());
                kept.push(listing);
            }
        }
    }

    MergeOutcome {
        total_after_dedup: kept.len(),
        listings: kept,
        total_before_dedup,
    }
}
