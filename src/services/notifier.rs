//! Delivery seam to the subscriber-facing channel.
//!
//! The scheduler only knows this trait; the binary decides what actually
//! carries the message. `LogNotifier` writes deliveries to the log, which
//! doubles as a dry-run mode.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ListingRecord;

/// Sends one record to one subscriber.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, subscriber_id: i64, record: &ListingRecord) -> Result<()>;
}

/// Subscriber-facing text for one record.
pub fn render_message(record: &ListingRecord) -> String {
    let listing = &record.listing;
    format!(
        "{city}, {district}\n\
         {kind}, {size} m2, {rooms} rooms\n\
         Posted by: {reporter}\n\
         Price: {price} {currency}\n\
         Published: {published}\n\
         {url}",
        city = listing.city,
        district = listing.district,
        kind = listing.property_type,
        size = listing.size_sqm,
        rooms = format_rooms(listing.rooms),
        reporter = listing.reporter,
        price = listing.price,
        currency = listing.currency,
        published = listing.published,
        url = listing.url,
    )
}

/// Room counts print without a fraction when they are whole.
fn format_rooms(rooms: f64) -> String {
    if rooms.fract() == 0.0 {
        format!("{rooms:.0}")
    } else {
        format!("{rooms}")
    }
}

/// Notifier that logs deliveries instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, subscriber_id: i64, record: &ListingRecord) -> Result<()> {
        log::info!(
            "Delivery to {subscriber_id}:\n{}",
            render_message(record)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, Listing, ORIGIN_SITE, PropertyType, Reporter};
    use chrono::Utc;

    fn sample_record() -> ListingRecord {
        ListingRecord {
            listing: Listing {
                city: City::Belgrade,
                district: "Vračar".to_string(),
                price: 550,
                currency: "€".to_string(),
                property_type: PropertyType::Flat,
                rooms: 2.5,
                size_sqm: 65,
                reporter: Reporter::Agency,
                published: "15.03.2026 10:30".to_string(),
                source_id: "stan-1".to_string(),
                origin_site: ORIGIN_SITE.to_string(),
                image_url: None,
                url: "https://www.halooglasi.com/nekretnine/izdavanje-stanova/stan-1".to_string(),
            },
            inserted_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_message_contains_key_fields() {
        let text = render_message(&sample_record());
        assert!(text.contains("Beograd, Vračar"));
        assert!(text.contains("flat, 65 m2, 2.5 rooms"));
        assert!(text.contains("Posted by: agency"));
        assert!(text.contains("Price: 550 €"));
        assert!(text.contains("Published: 15.03.2026 10:30"));
        assert!(text.contains("izdavanje-stanova/stan-1"));
    }

    #[test]
    fn test_whole_room_counts_print_without_fraction() {
        assert_eq!(format_rooms(4.0), "4");
        assert_eq!(format_rooms(2.5), "2.5");
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier.deliver(7, &sample_record()).await.is_ok());
    }
}
