//! Shared utilities.

pub mod http;
pub mod url;
