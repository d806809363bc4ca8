//! Dashboard for analyzing application usage records. Records are filtered, sorted, paged and
//! aggregated into totals, top applications and categories, and can be exported or cleared
//! from a terminal.
//!

pub mod analytics;
pub mod app;
pub mod cli;
pub mod export;
pub mod query;
pub mod settings;
pub mod store;
pub mod utils;
