//! Filter predicate evaluation.
//!
//! A filter is the logical AND across its populated dimensions; within one
//! dimension with several selected values the test is a logical OR. An empty
//! dimension imposes no constraint.

use crate::models::{Listing, ListingFilter};
use crate::normalize::normalize_rooms;

/// One parsed size-range selection token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeRange {
    /// `<N`: strictly below N
    Below(i64),
    /// `>N`: strictly above N
    Above(i64),
    /// `A-B`: inclusive on both ends
    Between(i64, i64),
}

impl SizeRange {
    /// Parse one selection token. Malformed tokens yield `None` and are
    /// ignored by the evaluator rather than failing the whole predicate.
    fn parse(token: &str) -> Option<SizeRange> {
        let token = token.trim();
        if let Some(rest) = token.strip_prefix('<') {
            return rest.trim().parse().ok().map(SizeRange::Below);
        }
        if let Some(rest) = token.strip_prefix('>') {
            return rest.trim().parse().ok().map(SizeRange::Above);
        }
        let (low, high) = token.split_once('-')?;
        Some(SizeRange::Between(
            low.trim().parse().ok()?,
            high.trim().parse().ok()?,
        ))
    }

    fn contains(&self, size: i64) -> bool {
        match *self {
            SizeRange::Below(max) => size < max,
            SizeRange::Above(min) => size > min,
            SizeRange::Between(low, high) => low <= size && size <= high,
        }
    }
}

impl ListingFilter {
    /// Evaluate the filter against a normalized listing.
    pub fn matches(&self, listing: &Listing) -> bool {
        listing.city == self.city
            && self.matches_district(listing)
            && self.matches_size(listing)
            && self.matches_price(listing)
            && self.matches_property_type(listing)
            && self.matches_rooms(listing)
            && self.matches_reporter(listing)
    }

    fn matches_district(&self, listing: &Listing) -> bool {
        self.districts.is_empty() || self.districts.iter().any(|d| d == &listing.district)
    }

    fn matches_size(&self, listing: &Listing) -> bool {
        let ranges: Vec<SizeRange> = self.sizes.iter().filter_map(|t| SizeRange::parse(t)).collect();
        // All tokens malformed is treated the same as none submitted.
        ranges.is_empty() || ranges.iter().any(|r| r.contains(listing.size_sqm))
    }

    fn matches_price(&self, listing: &Listing) -> bool {
        if let Some(min) = self.min_price {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }
        true
    }

    fn matches_property_type(&self, listing: &Listing) -> bool {
        self.property_types.is_empty() || self.property_types.contains(&listing.property_type)
    }

    fn matches_rooms(&self, listing: &Listing) -> bool {
        if self.rooms.is_empty() {
            return true;
        }
        // The "+" bucket is its own matchable category: selections run
        // through the same normalization as ingestion, so "4+" compares as
        // 4.0 against a record normalized from a raw "4+".
        self.rooms
            .iter()
            .filter_map(|token| normalize_rooms(token).ok())
            .any(|value| (listing.rooms - value).abs() < 1e-9)
    }

    fn matches_reporter(&self, listing: &Listing) -> bool {
        self.reporters.is_empty() || self.reporters.contains(&listing.reporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, ORIGIN_SITE, PropertyType, Reporter};

    fn sample_listing() -> Listing {
        Listing {
            city: City::Belgrade,
            district: "Vračar".to_string(),
            price: 550,
            currency: "€".to_string(),
            property_type: PropertyType::Flat,
            rooms: 2.5,
            size_sqm: 45,
            reporter: Reporter::Agency,
            published: "15.03.2026 10:30".to_string(),
            source_id: "stan-1".to_string(),
            origin_site: ORIGIN_SITE.to_string(),
            image_url: None,
            url: "https://www.halooglasi.com/nekretnine/izdavanje-stanova/stan-1".to_string(),
        }
    }

    fn empty_filter() -> ListingFilter {
        ListingFilter::for_city(City::Belgrade)
    }

    #[test]
    fn test_empty_dimensions_pass_through() {
        assert!(empty_filter().matches(&sample_listing()));
    }

    #[test]
    fn test_city_mismatch_fails() {
        let filter = ListingFilter::for_city(City::NoviSad);
        assert!(!filter.matches(&sample_listing()));
    }

    #[test]
    fn test_size_range_parse_shapes() {
        assert_eq!(SizeRange::parse("<20"), Some(SizeRange::Below(20)));
        assert_eq!(SizeRange::parse(">100"), Some(SizeRange::Above(100)));
        assert_eq!(SizeRange::parse("41-60"), Some(SizeRange::Between(41, 60)));
        assert_eq!(SizeRange::parse("large"), None);
        assert_eq!(SizeRange::parse("41-"), None);
    }

    #[test]
    fn test_size_45_matches_41_60() {
        let mut filter = empty_filter();
        filter.sizes = vec!["41-60".to_string()];
        assert!(filter.matches(&sample_listing()));
    }

    #[test]
    fn test_size_45_rejected_by_disjoint_ranges() {
        let mut filter = empty_filter();
        filter.sizes = vec!["<20".to_string(), "61-80".to_string()];
        assert!(!filter.matches(&sample_listing()));
    }

    #[test]
    fn test_size_range_bounds_inclusive() {
        let mut filter = empty_filter();
        filter.sizes = vec!["45-60".to_string()];
        assert!(filter.matches(&sample_listing()));
        filter.sizes = vec!["30-45".to_string()];
        assert!(filter.matches(&sample_listing()));
    }

    #[test]
    fn test_malformed_size_token_ignored() {
        let mut filter = empty_filter();
        filter.sizes = vec!["garbage".to_string(), "41-60".to_string()];
        assert!(filter.matches(&sample_listing()));
    }

    #[test]
    fn test_all_malformed_size_tokens_pass_through() {
        let mut filter = empty_filter();
        filter.sizes = vec!["garbage".to_string(), "??".to_string()];
        assert!(filter.matches(&sample_listing()));
    }

    #[test]
    fn test_rooms_plus_bucket_matches() {
        let mut listing = sample_listing();
        listing.rooms = 4.0;
        let mut filter = empty_filter();
        filter.rooms = vec!["4+".to_string()];
        assert!(filter.matches(&listing));
    }

    #[test]
    fn test_rooms_exact_value_matching() {
        let mut filter = empty_filter();
        filter.rooms = vec!["2.5".to_string()];
        assert!(filter.matches(&sample_listing()));
        filter.rooms = vec!["3".to_string()];
        assert!(!filter.matches(&sample_listing()));
    }

    #[test]
    fn test_price_bounds() {
        let mut filter = empty_filter();
        filter.min_price = Some(500);
        filter.max_price = Some(600);
        assert!(filter.matches(&sample_listing()));

        filter.min_price = Some(600);
        assert!(!filter.matches(&sample_listing()));

        filter.min_price = None;
        filter.max_price = Some(500);
        assert!(!filter.matches(&sample_listing()));
    }

    #[test]
    fn test_district_membership() {
        let mut filter = empty_filter();
        filter.districts = vec!["Zemun".to_string(), "Vračar".to_string()];
        assert!(filter.matches(&sample_listing()));

        filter.districts = vec!["Zemun".to_string()];
        assert!(!filter.matches(&sample_listing()));
    }

    #[test]
    fn test_property_type_and_reporter_dimensions() {
        let mut filter = empty_filter();
        filter.property_types = vec![PropertyType::House];
        assert!(!filter.matches(&sample_listing()));

        filter.property_types = vec![PropertyType::House, PropertyType::Flat];
        filter.reporters = vec![Reporter::Owner];
        assert!(!filter.matches(&sample_listing()));

        filter.reporters = vec![Reporter::Agency];
        assert!(filter.matches(&sample_listing()));
    }
}
