//! Listing index page extraction.
//!
//! Turns one fetched page into raw candidates. The absence of the listing
//! container (`div.product-list`) is the end-of-results signal; each
//! candidate element is extracted independently, so one broken tile never
//! aborts the page.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::normalize::RawListing;
use crate::utils::url::resolve;

/// Parsed-once CSS selectors for the source site's listing index markup.
pub struct PageSelectors {
    product_list: Selector,
    item: Selector,
    publish_date: Selector,
    title_link: Selector,
    image: Selector,
    feature_value: Selector,
    price: Selector,
    reporter: Selector,
    place: Selector,
}

/// What one page yielded.
#[derive(Debug, Default)]
pub struct PageExtract {
    /// Fresh candidates that survived extraction
    pub listings: Vec<RawListing>,
    /// Listing container missing: pagination is past the last real result
    pub end_of_results: bool,
    /// Candidate elements seen on the page
    pub candidates: usize,
    /// Candidates dropped for an extraction error
    pub skipped: usize,
    /// Candidates rejected by the freshness gate (published before cutoff)
    pub stale: usize,
}

impl PageSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            product_list: Self::parse("div.product-list")?,
            item: Self::parse("div.product-item:not(.banner-list)")?,
            publish_date: Self::parse("span.publish-date")?,
            title_link: Self::parse(".product-title a")?,
            image: Self::parse("img.resized-image")?,
            feature_value: Self::parse("ul.product-features div.value-wrapper")?,
            price: Self::parse("div.central-feature-wrapper span[data-value]")?,
            reporter: Self::parse("span.basic-info")?,
            place: Self::parse("ul.subtitle-places li")?,
        })
    }

    /// Extract all candidates from one page.
    ///
    /// `cutoff` is the crawl run's site-local start day: candidates
    /// published before it fail the freshness gate.
    pub fn extract_page(&self, html: &str, base: &Url, cutoff: NaiveDate) -> PageExtract {
        let document = Html::parse_document(html);
        let mut extract = PageExtract::default();

        if document.select(&self.product_list).next().is_none() {
            extract.end_of_results = true;
            return extract;
        }

        for element in document.select(&self.item) {
            extract.candidates += 1;
            match self.extract_candidate(&element, base) {
                Ok(raw) if raw.publish_date >= cutoff => extract.listings.push(raw),
                Ok(_) => extract.stale += 1,
                Err(e) => {
                    extract.skipped += 1;
                    log::warn!("Skipping candidate: {e}");
                }
            }
        }

        extract
    }

    /// Extract one listing element into raw fields.
    fn extract_candidate(&self, element: &ElementRef<'_>, base: &Url) -> Result<RawListing> {
        let raw_date = self
            .first_text(element, &self.publish_date)
            .ok_or_else(|| AppError::malformed("publish_date", "missing"))?;
        let publish_date = NaiveDate::parse_from_str(&raw_date, "%d.%m.%Y.")
            .map_err(|_| AppError::malformed("publish_date", &raw_date))?;

        let href = element
            .select(&self.title_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| AppError::malformed("url", "missing detail link"))?;
        let url = resolve(base, href).ok_or_else(|| AppError::malformed("url", href))?;

        let image_url = element
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);

        // Feature order on the index page is fixed: size first, rooms second.
        let mut features = element.select(&self.feature_value);
        let size = Self::own_text(features.next())
            .ok_or_else(|| AppError::malformed("size", "missing"))?;
        let rooms = Self::own_text(features.next())
            .ok_or_else(|| AppError::malformed("rooms", "missing"))?;

        let price = element
            .select(&self.price)
            .next()
            .and_then(|span| span.value().attr("data-value"))
            .ok_or_else(|| AppError::malformed("price", "missing"))?
            .to_string();

        let reporter = self
            .first_text(element, &self.reporter)
            .ok_or_else(|| AppError::malformed("reporter", "missing"))?;

        let mut places = element.select(&self.place);
        let city = Self::full_text(places.next())
            .ok_or_else(|| AppError::malformed("city", "missing"))?;
        let district = Self::full_text(places.next())
            .ok_or_else(|| AppError::malformed("district", "missing"))?;

        Ok(RawListing {
            publish_date,
            city,
            district,
            price,
            rooms,
            size,
            reporter,
            url,
            image_url,
        })
    }

    fn first_text(&self, element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        Self::full_text(element.select(selector).next())
    }

    /// Concatenated text of the whole element.
    fn full_text(element: Option<ElementRef<'_>>) -> Option<String> {
        let text = element?.text().collect::<String>().trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }

    /// First text chunk only; value wrappers append markup like `m<sup>2</sup>`.
    fn own_text(element: Option<ElementRef<'_>>) -> Option<String> {
        let text = element?.text().next()?.trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }

    fn parse(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
