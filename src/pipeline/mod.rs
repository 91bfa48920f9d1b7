//! End-to-end orchestration.

pub mod crawl;

pub use crawl::run_crawl;
