//! The API endpoints URIs.

/// The route for a month's transactions together with their statistics.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for one page of transactions matching a month and search text.
pub const LIST: &str = "/api/transactions/list";
/// The route for the number of transactions in each price range.
pub const BAR_CHART: &str = "/api/transactions/bar-chart";
/// The route for the number of transactions in each category.
pub const PIE_CHART: &str = "/api/transactions/pie-chart";
/// The route for the transaction list, sale totals and both charts at once.
pub const COMBINED: &str = "/api/transactions/combined";
/// The route for a month's sale totals.
pub const STATISTICS: &str = "/api/statistics";
/// The route to load the seed transactions into the store.
pub const INITIALIZE: &str = "/api/initialize";
