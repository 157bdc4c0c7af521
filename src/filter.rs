// Price/rating filters and the final ascending-price ordering

use crate::criteria::RangeFilter;
use crate::listing::Listing;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListingFilter {
    pub price: RangeFilter,
    pub rating: RangeFilter,
}

impl ListingFilter {
    pub fn new(price: RangeFilter, rating: RangeFilter) -> Self {
        Self { price, rating }
    }

    // A listing without a price cannot be shown to meet an active price bound
    pub fn matches<L: Listing>(&self, listing: &L) -> bool {
        let price_ok = match (self.price.is_active(), listing.price()) {
            (false, _) => true,
            (true, Some(price)) => self.price.contains(price),
            (true, None) => false,
        };
        // Unrated listings count as 0
        let rating_ok = !self.rating.is_active() || self.rating.contains(listing.rating().unwrap_or(0.0));

        price_ok && rating_ok
    }

    pub fn apply<L: Listing>(&self, listings: Vec<L>) -> Vec<L> {
        let mut kept: Vec<L> = listings.into_iter().filter(|l| self.matches(l)).collect();
        sort_by_price(&mut kept);
        kept
    }
}

// Stable ascending sort; absent prices sort last
pub fn sort_by_price<L: Listing>(listings: &mut [L]) {
    listings.sort_by(|a, b| a.effective_price().total_cmp(&b.effective_price()));
}
