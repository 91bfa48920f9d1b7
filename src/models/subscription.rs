//! Subscription data structures.
//!
//! One `Subscription` per subscriber: the active filter, the delivery
//! interval, the watermark cursor, and the active flag. Reconfiguration
//! replaces the subscription wholesale, it never merges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{City, PropertyType, Reporter};

/// Filter criteria a subscriber selected.
///
/// The city is mandatory; every other dimension is a set where empty means
/// "no constraint". Size and room entries are kept as the raw selection
/// tokens (`"41-60"`, `"4+"`) and interpreted by the predicate evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingFilter {
    /// City to search in (required)
    pub city: City,

    /// Selected district names
    #[serde(default)]
    pub districts: Vec<String>,

    /// Selected size-range tokens: `<N`, `>N`, or `A-B`
    #[serde(default)]
    pub sizes: Vec<String>,

    /// Minimum price in whole currency units
    #[serde(default)]
    pub min_price: Option<i64>,

    /// Maximum price in whole currency units
    #[serde(default)]
    pub max_price: Option<i64>,

    /// Selected property types
    #[serde(default)]
    pub property_types: Vec<PropertyType>,

    /// Selected room buckets: `0`, `0.5`, ... `4+`
    #[serde(default)]
    pub rooms: Vec<String>,

    /// Selected reporter categories
    #[serde(default)]
    pub reporters: Vec<Reporter>,
}

impl ListingFilter {
    /// Filter with only the mandatory city set.
    pub fn for_city(city: City) -> Self {
        Self {
            city,
            districts: Vec::new(),
            sizes: Vec::new(),
            min_price: None,
            max_price: None,
            property_types: Vec::new(),
            rooms: Vec::new(),
            reporters: Vec::new(),
        }
    }

    /// One-line summary of the populated dimensions, for operator output.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("city={}", self.city)];
        if !self.districts.is_empty() {
            parts.push(format!("districts={}", self.districts.join(",")));
        }
        if !self.sizes.is_empty() {
            parts.push(format!("sizes={}", self.sizes.join(",")));
        }
        if let Some(min) = self.min_price {
            parts.push(format!("min_price={min}"));
        }
        if let Some(max) = self.max_price {
            parts.push(format!("max_price={max}"));
        }
        if !self.property_types.is_empty() {
            let labels: Vec<&str> = self.property_types.iter().map(|t| t.label()).collect();
            parts.push(format!("types={}", labels.join(",")));
        }
        if !self.rooms.is_empty() {
            parts.push(format!("rooms={}", self.rooms.join(",")));
        }
        if !self.reporters.is_empty() {
            let labels: Vec<&str> = self.reporters.iter().map(|r| r.label()).collect();
            parts.push(format!("reporters={}", labels.join(",")));
        }
        parts.join(" ")
    }
}

/// Per-subscriber delivery state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    /// Unique subscriber identifier
    pub subscriber_id: i64,

    /// Active filter criteria
    pub filter: ListingFilter,

    /// Delivery interval in seconds
    pub interval_secs: u64,

    /// Watermark cursor: only records inserted strictly after this
    /// timestamp are eligible for delivery
    pub watermark: DateTime<Utc>,

    /// Whether the delivery job should run
    pub active: bool,
}

impl Subscription {
    /// Create an active subscription with the watermark at "now", so a new
    /// subscriber does not receive historical records.
    pub fn new(subscriber_id: i64, filter: ListingFilter, interval_secs: u64) -> Self {
        Self {
            subscriber_id,
            filter,
            interval_secs,
            watermark: Utc::now(),
            active: true,
        }
    }

    /// Validate subscription values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(AppError::validation("subscription interval must be > 0"));
        }
        if let (Some(min), Some(max)) = (self.filter.min_price, self.filter.max_price) {
            if min > max {
                return Err(AppError::validation("min_price must not exceed max_price"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subscription_starts_active_at_now() {
        let before = Utc::now();
        let sub = Subscription::new(42, ListingFilter::for_city(City::Belgrade), 600);
        assert!(sub.active);
        assert!(sub.watermark >= before);
        assert!(sub.watermark <= Utc::now());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut sub = Subscription::new(1, ListingFilter::for_city(City::NoviSad), 600);
        sub.interval_secs = 0;
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_price_bounds() {
        let mut sub = Subscription::new(1, ListingFilter::for_city(City::Belgrade), 600);
        sub.filter.min_price = Some(800);
        sub.filter.max_price = Some(400);
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_filter_defaults_deserialize() {
        let filter: ListingFilter = serde_json::from_str(r#"{"city":"belgrade"}"#).unwrap();
        assert_eq!(filter.city, City::Belgrade);
        assert!(filter.districts.is_empty());
        assert!(filter.min_price.is_none());
    }

    #[test]
    fn test_summary_lists_populated_dimensions() {
        let mut filter = ListingFilter::for_city(City::Belgrade);
        filter.sizes = vec!["41-60".to_string()];
        filter.max_price = Some(700);
        let summary = filter.summary();
        assert!(summary.contains("city=Beograd"));
        assert!(summary.contains("sizes=41-60"));
        assert!(summary.contains("max_price=700"));
        assert!(!summary.contains("min_price"));
    }
}
