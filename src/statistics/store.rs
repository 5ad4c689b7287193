//! Statistics computed by the database instead of in memory.
//!
//! These queries follow the same rules as the functions in
//! [engine](super::engine), so both give the same figures for the same data.

use rusqlite::{Connection, named_params};

use crate::{
    Error,
    month::MonthFilter,
    transaction::{MONTH_CONDITION, month_param},
};

use super::{
    config::{PriceRange, SaleAmountPolicy},
    engine::{CategoryCount, PriceRangeCount, SaleSummary},
};

/// The SQL condition for a price that may be summed or bucketed.
///
/// SQLite reads `9e999` as positive infinity, and NaN is never stored.
const VALID_PRICE_CONDITION: &str = "(price >= 0 AND price < 9e999)";

/// Get the sale totals for the transactions sold in `month`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_sale_summary(
    month: Option<MonthFilter>,
    policy: SaleAmountPolicy,
    connection: &Connection,
) -> Result<SaleSummary, Error> {
    let sold_only = policy == SaleAmountPolicy::SoldOnly;

    connection
        .prepare(&format!(
            "SELECT \
                COALESCE(SUM(CASE WHEN {VALID_PRICE_CONDITION} AND (:sold_only = 0 OR sold = 1) THEN price ELSE 0.0 END), 0.0), \
                COUNT(CASE WHEN sold = 1 THEN 1 END), \
                COUNT(CASE WHEN sold = 0 THEN 1 END) \
            FROM \"transaction\" WHERE {MONTH_CONDITION}"
        ))?
        .query_row(
            named_params! { ":month": month_param(month), ":sold_only": sold_only },
            |row| {
                Ok(SaleSummary {
                    total_sale_amount: row.get(0)?,
                    total_sold_items: row.get::<_, i64>(1)? as u64,
                    total_not_sold_items: row.get::<_, i64>(2)? as u64,
                })
            },
        )
        .map_err(Error::from)
}

/// Count the transactions sold in `month` with a price in each of `ranges`.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails.
pub fn get_price_range_counts(
    month: Option<MonthFilter>,
    ranges: &[PriceRange],
    connection: &Connection,
) -> Result<Vec<PriceRangeCount>, Error> {
    let month = month_param(month);
    let mut statement = connection.prepare(&format!(
        "SELECT COUNT(*) FROM \"transaction\" \
        WHERE {MONTH_CONDITION} \
        AND {VALID_PRICE_CONDITION} AND price >= :min AND (:max IS NULL OR price < :max)"
    ))?;

    ranges
        .iter()
        .map(|range| -> Result<PriceRangeCount, Error> {
            let count: i64 = statement.query_row(
                named_params! { ":month": month, ":min": range.min, ":max": range.max },
                |row| row.get(0),
            )?;

            Ok(PriceRangeCount {
                range: range.label(),
                count: count as u64,
            })
        })
        .collect()
}

/// Count the transactions sold in `month` in every category that occurs,
/// sorted by category.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_category_counts(
    month: Option<MonthFilter>,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    connection
        .prepare(&format!(
            "SELECT category, COUNT(*) FROM \"transaction\" \
            WHERE {MONTH_CONDITION} \
            GROUP BY category ORDER BY category ASC"
        ))?
        .query_map(named_params! { ":month": month_param(month) }, |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?
        .map(|count_result| count_result.map_err(Error::from))
        .collect()
}
