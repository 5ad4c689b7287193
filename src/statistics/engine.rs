//! Month-filtered statistics over an in-memory collection of transactions.
//!
//! Every function here is pure: the input is never modified and the same
//! input always gives the same output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{month::MonthFilter, transaction::Transaction};

use super::config::{PriceRange, SaleAmountPolicy, StatisticsConfig};

/// Sale totals for a set of transactions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    /// The summed prices, see [SaleAmountPolicy].
    pub total_sale_amount: f64,
    /// How many transactions were sold.
    pub total_sold_items: u64,
    /// How many transactions were not sold.
    pub total_not_sold_items: u64,
}

/// The number of transactions in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// The category label.
    pub category: String,
    /// How many transactions have that category.
    pub count: u64,
}

/// The number of transactions in one price range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRangeCount {
    /// The range label, e.g. "100-200".
    pub range: String,
    /// How many transactions have a price in the range.
    pub count: u64,
}

/// Aggregate figures for the transactions sold in a month.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Sale totals.
    #[serde(flatten)]
    pub summary: SaleSummary,
    /// Counts for each configured category, in configured order.
    pub category_wise_data: Vec<CategoryCount>,
    /// Counts for each configured price range, in configured order.
    pub price_range_data: Vec<PriceRangeCount>,
}

/// Compute statistics for the transactions in `transactions` sold in
/// `month`, or for all of them when `month` is `None`.
///
/// A month with no transactions gives zero totals and zero counts rather
/// than an error.
pub fn compute_statistics(
    transactions: &[Transaction],
    month: Option<MonthFilter>,
    config: &StatisticsConfig,
) -> Statistics {
    summarize(&filter_by_month(transactions, month), config)
}

/// Compute statistics for an already filtered set of transactions.
pub fn summarize(transactions: &[&Transaction], config: &StatisticsConfig) -> Statistics {
    Statistics {
        summary: sale_summary(transactions, config.sale_amount_policy),
        category_wise_data: category_breakdown(transactions, &config.categories),
        price_range_data: price_range_breakdown(transactions, &config.price_ranges),
    }
}

/// Keep the transactions sold in `month`, in their original order.
///
/// Transactions with an unparsable sale date only survive when there is no
/// filter.
pub fn filter_by_month(
    transactions: &[Transaction],
    month: Option<MonthFilter>,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|transaction| month.is_none_or(|month| month.matches(&transaction.date_of_sale)))
        .collect()
}

/// Count sold and unsold transactions and add up their prices according to
/// `policy`.
///
/// Negative and non-finite prices add nothing to the total but the
/// transaction is still counted.
pub fn sale_summary(transactions: &[&Transaction], policy: SaleAmountPolicy) -> SaleSummary {
    let mut summary = SaleSummary::default();

    for transaction in transactions {
        if transaction.sold {
            summary.total_sold_items += 1;
        } else {
            summary.total_not_sold_items += 1;
        }

        let included = match policy {
            SaleAmountPolicy::SoldOnly => transaction.sold,
            SaleAmountPolicy::AllFiltered => true,
        };

        if included && is_valid_price(transaction.price) {
            summary.total_sale_amount += transaction.price;
        }
    }

    summary
}

/// Count transactions in each of `categories`, in the order given.
///
/// Categories are compared exactly. Transactions whose category is not
/// listed are not counted anywhere.
pub fn category_breakdown(
    transactions: &[&Transaction],
    categories: &[String],
) -> Vec<CategoryCount> {
    categories
        .iter()
        .map(|category| CategoryCount {
            category: category.clone(),
            count: transactions
                .iter()
                .filter(|transaction| &transaction.category == category)
                .count() as u64,
        })
        .collect()
}

/// Count transactions in every category that occurs, sorted by label.
pub fn category_counts(transactions: &[&Transaction]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();

    for transaction in transactions {
        *counts.entry(transaction.category.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_owned(),
            count,
        })
        .collect()
}

/// Count transactions in each of `ranges`, in the order given.
///
/// Negative and non-finite prices are not counted in any range.
pub fn price_range_breakdown(
    transactions: &[&Transaction],
    ranges: &[PriceRange],
) -> Vec<PriceRangeCount> {
    ranges
        .iter()
        .map(|range| PriceRangeCount {
            range: range.label(),
            count: transactions
                .iter()
                .filter(|transaction| range.contains(transaction.price))
                .count() as u64,
        })
        .collect()
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}
