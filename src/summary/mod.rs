//! Spending summaries: totals by category, by week or month, and by budget.
//!
//! This module contains:
//! - Aggregation of transaction amounts for a report kind
//! - Table views for the summary page
//! - Route handlers for the summary page and its JSON chart series

mod aggregation;
mod handlers;
mod tables;

pub use aggregation::ReportKind;
pub use handlers::{get_summary_json, get_summary_page};
