//! Dual-backend search query and latency comparison tool.
//!
//! The same phrase is issued against a PostgreSQL full-text index and an
//! Elasticsearch index. Results are normalized into [`models::Hit`]
//! records and repeated timed trials are reduced into latency statistics.

pub mod backend;
pub mod bench;
pub mod cli;
pub mod error;
pub mod models;
pub mod report;
pub mod search;

pub use error::{Error, Result};
