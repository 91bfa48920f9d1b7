//! rentwatch CLI
//!
//! Local execution entry point: one-shot crawls, the continuous
//! crawl-and-deliver service, and subscription management.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rentwatch::{
    error::Result,
    models::{City, Config, ListingFilter, PropertyType, Reporter, Subscription},
    pipeline,
    scheduler::DeliveryScheduler,
    services::{HttpFetcher, LogNotifier, Notifier},
    store::{JsonSubscriptionStore, ListingSink, MemorySink, SubscriptionStore},
};

/// rentwatch - Rental Listing Watcher
#[derive(Parser, Debug)]
#[command(name = "rentwatch", version, about = "Rental listing crawler and delivery service")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one crawl pass and report what was ingested
    Crawl,

    /// Run the service: recurring crawls plus per-subscriber delivery
    Run,

    /// Create or replace a subscription
    Subscribe {
        /// Subscriber identifier
        #[arg(long)]
        subscriber_id: i64,

        /// City to watch (belgrade or novi-sad)
        #[arg(long)]
        city: String,

        /// District names; repeat for several
        #[arg(long)]
        district: Vec<String>,

        /// Size selections like "41-60", "<20" or ">100"; repeat for several
        #[arg(long)]
        size: Vec<String>,

        /// Lowest acceptable price
        #[arg(long)]
        min_price: Option<i64>,

        /// Highest acceptable price
        #[arg(long)]
        max_price: Option<i64>,

        /// Property types (flat or house); repeat for several
        #[arg(long)]
        property_type: Vec<String>,

        /// Room selections like "2", "2.5" or "4+"; repeat for several
        #[arg(long)]
        rooms: Vec<String>,

        /// Reporters (agency or owner); repeat for several
        #[arg(long)]
        reporter: Vec<String>,

        /// Delivery interval in seconds (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Remove a subscription
    Unsubscribe {
        /// Subscriber identifier
        #[arg(long)]
        subscriber_id: i64,
    },

    /// Validate the configuration file
    Validate,

    /// Show configured paths and stored subscriptions
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("rentwatch starting...");

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Crawl => {
            let fetcher = HttpFetcher::new(&config)?;
            let sink = MemorySink::from_config(&config.sink);
            let outcome = pipeline::run_crawl(&config, &fetcher, &sink).await?;

            if outcome.failed_pairs > 0 {
                log::warn!("{} pagination runs aborted", outcome.failed_pairs);
            }
            log::info!("Crawl complete: {} new listings", outcome.accepted);
        }

        Command::Run => {
            let fetcher = HttpFetcher::new(&config)?;
            let sink: Arc<dyn ListingSink> = Arc::new(MemorySink::from_config(&config.sink));
            let subscriptions: Arc<dyn SubscriptionStore> = Arc::new(
                JsonSubscriptionStore::open(&config.paths.subscriptions_file).await?,
            );
            let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

            let scheduler = DeliveryScheduler::new(
                Arc::clone(&sink),
                Arc::clone(&subscriptions),
                notifier,
                &config.scheduler,
            );
            let restored = scheduler.restore().await?;
            log::info!("Restored {} delivery jobs", restored);

            let pause = Duration::from_secs(config.scheduler.crawl_interval_secs);
            loop {
                if let Err(e) = pipeline::run_crawl(&config, &fetcher, sink.as_ref()).await {
                    log::error!("Crawl run failed: {e}");
                }
                tokio::time::sleep(pause).await;
            }
        }

        Command::Subscribe {
            subscriber_id,
            city,
            district,
            size,
            min_price,
            max_price,
            property_type,
            rooms,
            reporter,
            interval,
        } => {
            let mut filter = ListingFilter::for_city(City::from_str(&city)?);
            filter.districts = district;
            filter.sizes = size;
            filter.min_price = min_price;
            filter.max_price = max_price;
            filter.property_types = property_type
                .iter()
                .map(|t| PropertyType::from_str(t))
                .collect::<Result<Vec<_>>>()?;
            filter.rooms = rooms;
            filter.reporters = reporter
                .iter()
                .map(|r| Reporter::from_str(r))
                .collect::<Result<Vec<_>>>()?;

            let interval = interval.unwrap_or(config.scheduler.default_interval_secs);
            let subscription = Subscription::new(subscriber_id, filter, interval);

            let store = JsonSubscriptionStore::open(&config.paths.subscriptions_file).await?;
            store.put(subscription.clone()).await?;

            log::info!(
                "Subscription for {subscriber_id} saved: {}",
                subscription.filter.summary()
            );
            log::info!("Restart the service to pick up the change.");
        }

        Command::Unsubscribe { subscriber_id } => {
            let store = JsonSubscriptionStore::open(&config.paths.subscriptions_file).await?;
            if store.remove(subscriber_id).await? {
                log::info!("Subscription for {subscriber_id} removed");
            } else {
                log::warn!("No subscription found for {subscriber_id}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("Config OK");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Subscriptions file: {}", config.paths.subscriptions_file);

            let store = JsonSubscriptionStore::open(&config.paths.subscriptions_file).await?;
            let active = store.list_active().await?;
            log::info!("{} active subscriptions", active.len());
            for subscription in active {
                log::info!(
                    "  {} every {}s: {}",
                    subscription.subscriber_id,
                    subscription.interval_secs,
                    subscription.filter.summary()
                );
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
