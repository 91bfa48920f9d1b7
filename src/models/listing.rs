//! Listing data structures and categorical enums.
//!
//! The enums carry the fixed source-language token tables: the crawl source
//! labels cities, property types and reporters in Serbian, while the rest of
//! the system works with canonical enum values.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Identifier of the scrape source, stored on every record.
pub const ORIGIN_SITE: &str = "halooglasi";

/// City covered by the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Belgrade,
    NoviSad,
}

impl City {
    pub const ALL: [City; 2] = [City::Belgrade, City::NoviSad];

    /// Lookup from the source site's locality label (case-insensitive).
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().as_str() {
            "beograd" => Ok(City::Belgrade),
            "novi sad" => Ok(City::NoviSad),
            _ => Err(AppError::unknown_category("city", token)),
        }
    }

    /// URL path slug used by the source site.
    pub fn slug(&self) -> &'static str {
        match self {
            City::Belgrade => "beograd",
            City::NoviSad => "novi-sad",
        }
    }

    /// Display label for subscriber-facing text.
    pub fn label(&self) -> &'static str {
        match self {
            City::Belgrade => "Beograd",
            City::NoviSad => "Novi Sad",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for City {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "belgrade" | "beograd" => Ok(City::Belgrade),
            "novi-sad" | "novi_sad" | "novi sad" => Ok(City::NoviSad),
            _ => Err(AppError::unknown_category("city", s)),
        }
    }
}

/// Listing category crawled from the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FlatRentals,
    HouseRentals,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::FlatRentals, Category::HouseRentals];

    /// URL path slug used by the source site.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::FlatRentals => "izdavanje-stanova",
            Category::HouseRentals => "izdavanje-kuca",
        }
    }

    /// Property type implied by the category.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Category::FlatRentals => PropertyType::Flat,
            Category::HouseRentals => PropertyType::House,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Kind of property a listing offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Flat,
    House,
}

impl PropertyType {
    /// Lookup from the source site's token (case-insensitive).
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().as_str() {
            "stan" => Ok(PropertyType::Flat),
            "kuća" | "kuca" => Ok(PropertyType::House),
            _ => Err(AppError::unknown_category("property_type", token)),
        }
    }

    /// Display label for subscriber-facing text.
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Flat => "flat",
            PropertyType::House => "house",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(PropertyType::Flat),
            "house" => Ok(PropertyType::House),
            _ => Err(AppError::unknown_category("property_type", s)),
        }
    }
}

/// Who posted the listing on the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reporter {
    Agency,
    Owner,
}

impl Reporter {
    /// Lookup from the source site's reporter label (case-insensitive).
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().as_str() {
            "agencija" => Ok(Reporter::Agency),
            "vlasnik" => Ok(Reporter::Owner),
            _ => Err(AppError::unknown_category("reporter", token)),
        }
    }

    /// Display label for subscriber-facing text.
    pub fn label(&self) -> &'static str {
        match self {
            Reporter::Agency => "agency",
            Reporter::Owner => "owner",
        }
    }
}

impl fmt::Display for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Reporter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "agency" => Ok(Reporter::Agency),
            "owner" => Ok(Reporter::Owner),
            _ => Err(AppError::unknown_category("reporter", s)),
        }
    }
}

/// A normalized rental offer, ready for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// City the offer is located in
    pub city: City,

    /// District name, administrative prefix stripped
    pub district: String,

    /// Price in whole currency units
    pub price: i64,

    /// Currency symbol
    pub currency: String,

    /// Kind of property
    pub property_type: PropertyType,

    /// Room count in 0.5 steps; a raw "4+" collapses to 4.0
    pub rooms: f64,

    /// Living area in square meters
    pub size_sqm: i64,

    /// Who posted the offer
    pub reporter: Reporter,

    /// Site-local publish time, display-only
    pub published: String,

    /// Identity fragment from the detail URL's last path segment
    pub source_id: String,

    /// Scrape source label
    pub origin_site: String,

    /// Thumbnail URL, if the listing has one
    pub image_url: Option<String>,

    /// Full URL to the listing detail page
    pub url: String,
}

impl Listing {
    /// Identity key: globally unique across all ever-ingested records.
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.source_id, &self.origin_site)
    }

    /// Basic validity check applied by the sink before acceptance.
    pub fn validate(&self) -> Result<()> {
        if self.source_id.trim().is_empty() {
            return Err(AppError::validation("listing source_id is empty"));
        }
        if self.url.trim().is_empty() {
            return Err(AppError::validation("listing url is empty"));
        }
        if self.price <= 0 {
            return Err(AppError::validation("listing price must be > 0"));
        }
        if self.size_sqm <= 0 {
            return Err(AppError::validation("listing size must be > 0"));
        }
        if self.rooms < 0.0 {
            return Err(AppError::validation("listing rooms must be >= 0"));
        }
        Ok(())
    }
}

/// An accepted listing as stored by the ingestion sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    #[serde(flatten)]
    pub listing: Listing,

    /// Insertion timestamp assigned by the sink at accept time
    pub inserted_at: DateTime<Utc>,
}
