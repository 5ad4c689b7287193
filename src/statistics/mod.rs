//! Month-filtered statistics: sale totals, a category breakdown and a
//! price-range histogram.
//!
//! The [engine] computes statistics from transactions held in memory, the
//! [store] asks the database for the same figures.

mod combined_endpoint;
mod config;
pub(crate) mod engine;
mod handlers;
pub(crate) mod store;

pub use combined_endpoint::{CombinedData, get_combined_data};
pub use config::{PriceRange, SaleAmountPolicy, StatisticsConfig};
pub use engine::{
    CategoryCount, PriceRangeCount, SaleSummary, Statistics, category_counts, compute_statistics,
    filter_by_month, summarize,
};
pub use handlers::{MonthQuery, get_bar_chart, get_pie_chart, get_statistics};
