//! Metrics module for ride summaries.

pub mod summary;

pub use summary::{SessionSummary, SummaryAccumulator};
