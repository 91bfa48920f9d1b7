//! Field normalization.
//!
//! Converts the source site's locale-specific raw text into canonical typed
//! values: prices with grouping separators, room counts with a trailing `+`,
//! sizes with a unit suffix, and categorical labels in the site's language.
//! Failures are per-field and reject only the one candidate record.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{AppError, Result};
use crate::models::{Category, City, Listing, ORIGIN_SITE, Reporter};
use crate::utils::url::listing_id;

/// Parse a raw price: grouping `.` and `,` stripped, then integer.
///
/// `"1.250"` → `1250`.
pub fn normalize_price(raw: &str) -> Result<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '.' && *c != ',' && !c.is_whitespace())
        .collect();
    cleaned
        .parse()
        .map_err(|_| AppError::malformed("price", raw))
}

/// Parse a raw room count: trailing `+` stripped, decimal comma accepted.
///
/// `"4+"` → `4.0`, `"2.5"` → `2.5`. The `+` bucket keeps its meaning on the
/// filtering side, where the same normalization is applied to the selection.
pub fn normalize_rooms(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().trim_end_matches('+').replace(',', ".");
    cleaned
        .parse()
        .map_err(|_| AppError::malformed("rooms", raw))
}

/// Parse a raw size: `m2`/`m` unit suffix stripped, then whole square meters.
///
/// `"65 m2"` → `65`.
pub fn normalize_size(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    let without_unit = trimmed
        .strip_suffix("m2")
        .or_else(|| trimmed.strip_suffix('m'))
        .unwrap_or(trimmed)
        .trim();
    let value: f64 = without_unit
        .replace(',', ".")
        .parse()
        .map_err(|_| AppError::malformed("size", raw))?;
    Ok(value as i64)
}

/// Strip the administrative-area prefix from a district name.
///
/// `"Opština Vračar"` → `"Vračar"`; anything else passes through unchanged.
pub fn normalize_district(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("Opština ")
        .unwrap_or(trimmed)
        .to_string()
}

/// A candidate extracted from one listing element, fields still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    /// Publish date shown on the listing index
    pub publish_date: NaiveDate,

    /// Locality label for the city
    pub city: String,

    /// Locality label for the district
    pub district: String,

    /// Price as found in the element's data attribute
    pub price: String,

    /// Room count label
    pub rooms: String,

    /// Size label with unit suffix
    pub size: String,

    /// Reporter label
    pub reporter: String,

    /// Absolute detail URL
    pub url: String,

    /// Thumbnail URL, if present
    pub image_url: Option<String>,
}

impl RawListing {
    /// Normalize every field into a `Listing`.
    ///
    /// `now_site` is the site-local wall clock at processing time; it only
    /// feeds the display-only `published` string.
    pub fn normalize(
        &self,
        category: Category,
        now_site: DateTime<FixedOffset>,
    ) -> Result<Listing> {
        let source_id =
            listing_id(&self.url).ok_or_else(|| AppError::malformed("url", &self.url))?;

        Ok(Listing {
            city: City::from_token(&self.city)?,
            district: normalize_district(&self.district),
            price: normalize_price(&self.price)?,
            currency: "€".to_string(),
            property_type: category.property_type(),
            rooms: normalize_rooms(&self.rooms)?,
            size_sqm: normalize_size(&self.size)?,
            reporter: Reporter::from_token(&self.reporter)?,
            published: now_site.format("%d.%m.%Y %H:%M").to_string(),
            source_id,
            origin_site: ORIGIN_SITE.to_string(),
            image_url: self.image_url.clone(),
            url: self.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use chrono::TimeZone;

    fn sample_raw() -> RawListing {
        RawListing {
            publish_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            city: "Beograd".to_string(),
            district: "Opština Vračar".to_string(),
            price: "1.250".to_string(),
            rooms: "2.5".to_string(),
            size: "65 m2".to_string(),
            reporter: "Agencija".to_string(),
            url: "https://www.halooglasi.com/nekretnine/izdavanje-stanova/stan-vracar-5425636952?kid=4".to_string(),
            image_url: Some("https://img.halooglasi.com/slika.jpg".to_string()),
        }
    }

    fn site_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 15, 10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_price_strips_grouping_separators() {
        assert_eq!(normalize_price("1.250").unwrap(), 1250);
        assert_eq!(normalize_price("550").unwrap(), 550);
        assert_eq!(normalize_price("2,100").unwrap(), 2100);
    }

    #[test]
    fn test_price_rejects_non_numeric() {
        assert!(normalize_price("po dogovoru").is_err());
        assert!(normalize_price("").is_err());
    }

    #[test]
    fn test_rooms_plain_and_plus_bucket() {
        assert_eq!(normalize_rooms("2.5").unwrap(), 2.5);
        assert_eq!(normalize_rooms("4+").unwrap(), 4.0);
        assert_eq!(normalize_rooms("1,5").unwrap(), 1.5);
        assert!(normalize_rooms("mnogo").is_err());
    }

    #[test]
    fn test_size_strips_unit_suffix() {
        assert_eq!(normalize_size("65 m2").unwrap(), 65);
        assert_eq!(normalize_size("120m2").unwrap(), 120);
        assert_eq!(normalize_size("48 m").unwrap(), 48);
        assert_eq!(normalize_size("33,5 m2").unwrap(), 33);
        assert!(normalize_size("veliki").is_err());
    }

    #[test]
    fn test_district_prefix_stripping() {
        assert_eq!(normalize_district("Opština Vračar"), "Vračar");
        assert_eq!(normalize_district("Novi Beograd"), "Novi Beograd");
    }

    #[test]
    fn test_normalize_full_listing() {
        let listing = sample_raw()
            .normalize(Category::FlatRentals, site_now())
            .unwrap();
        assert_eq!(listing.city, City::Belgrade);
        assert_eq!(listing.district, "Vračar");
        assert_eq!(listing.price, 1250);
        assert_eq!(listing.property_type, PropertyType::Flat);
        assert_eq!(listing.rooms, 2.5);
        assert_eq!(listing.size_sqm, 65);
        assert_eq!(listing.source_id, "stan-vracar-5425636952");
        assert_eq!(listing.origin_site, ORIGIN_SITE);
        assert_eq!(listing.published, "15.03.2026 10:30");
    }

    #[test]
    fn test_normalize_rejects_unknown_reporter() {
        let mut raw = sample_raw();
        raw.reporter = "Investitor".to_string();
        assert!(raw.normalize(Category::FlatRentals, site_now()).is_err());
    }

    #[test]
    fn test_normalize_rejects_url_without_segment() {
        let mut raw = sample_raw();
        raw.url = "https://www.halooglasi.com/".to_string();
        assert!(raw.normalize(Category::FlatRentals, site_now()).is_err());
    }
}
