// src/lib.rs

//! Rental listing watcher: crawls classifieds listing indexes, normalizes
//! and deduplicates offers into an append-only sink, and fans new records
//! out to subscribers on per-subscription schedules.

pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{AppError, Result};
