//! The buckets statistics are counted into.
//!
//! Category labels and price ranges are data rather than code so they can be
//! changed without touching the aggregation logic.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Which transactions `totalSaleAmount` adds up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleAmountPolicy {
    /// Sum the prices of sold transactions only.
    #[default]
    SoldOnly,
    /// Sum the prices of every transaction in the filtered set.
    AllFiltered,
}

/// A price bucket. The lower bound is inclusive and the upper bound is
/// exclusive. A range with no upper bound holds every price from `min` up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// The smallest price in the range.
    pub min: f64,
    /// The price the range stops just short of, or `None` if unbounded.
    #[serde(default)]
    pub max: Option<f64>,
}

impl PriceRange {
    /// A range from `min` up to but not including `max`.
    pub fn bounded(min: f64, max: f64) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// A range holding every price from `min` up.
    pub fn unbounded(min: f64) -> Self {
        Self { min, max: None }
    }

    /// Whether `price` falls in this range. Negative and non-finite prices
    /// fall in no range.
    pub fn contains(&self, price: f64) -> bool {
        price.is_finite()
            && price >= 0.0
            && price >= self.min
            && self.max.is_none_or(|max| price < max)
    }

    /// The label for the range, e.g. "0-100" or "900-above".
    pub fn label(&self) -> String {
        match self.max {
            Some(max) => format!("{}-{}", self.min, max),
            None => format!("{}-above", self.min),
        }
    }
}

/// The buckets and policies used to compute [Statistics](super::Statistics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// The category labels reported in `categoryWiseData`, in order.
    ///
    /// Transactions in other categories are left out of that breakdown.
    pub categories: Vec<String>,
    /// The contiguous price ranges reported in `priceRangeData`, in
    /// ascending order. The last range must be unbounded.
    pub price_ranges: Vec<PriceRange>,
    /// Which transactions `totalSaleAmount` adds up.
    pub sale_amount_policy: SaleAmountPolicy,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        let mut price_ranges: Vec<PriceRange> = (0..9)
            .map(|i| PriceRange::bounded(i as f64 * 100.0, (i + 1) as f64 * 100.0))
            .collect();
        price_ranges.push(PriceRange::unbounded(900.0));

        Self {
            categories: ["electronics", "jewelery", "men's clothing", "women's clothing"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            price_ranges,
            sale_amount_policy: SaleAmountPolicy::default(),
        }
    }
}

impl StatisticsConfig {
    /// Read a config from a JSON file. Fields missing from the file take
    /// their default values.
    ///
    /// # Errors
    /// Returns [Error::Io] if the file cannot be read, or
    /// [Error::InvalidStatisticsConfig] if it is not a valid config.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|error| Error::Io(format!("{}: {error}", path.display())))?;

        let config: Self = serde_json::from_str(&text)
            .map_err(|error| Error::InvalidStatisticsConfig(error.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that every transaction can land in at most one bucket of each
    /// kind, and that every non-negative price lands in a price bucket at or
    /// above the first range's minimum.
    ///
    /// # Errors
    /// Returns [Error::InvalidStatisticsConfig] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Err(Error::InvalidStatisticsConfig(message));

        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(category) {
                return invalid(format!("category {category:?} is listed more than once"));
            }
        }

        let Some(last) = self.price_ranges.last() else {
            return invalid("at least one price range is required".to_owned());
        };

        if last.max.is_some() {
            return invalid(format!(
                "the last price range {} must not have an upper bound",
                last.label()
            ));
        }

        for (i, range) in self.price_ranges.iter().enumerate() {
            if !range.min.is_finite() || range.min < 0.0 {
                return invalid(format!(
                    "price range {} must start at a non-negative number",
                    range.label()
                ));
            }

            if let Some(max) = range.max {
                if !max.is_finite() || max <= range.min {
                    return invalid(format!(
                        "price range {} must end after it starts",
                        range.label()
                    ));
                }
            }

            if let Some(next) = self.price_ranges.get(i + 1) {
                match range.max {
                    None => {
                        return invalid(format!(
                            "only the last price range may be unbounded, found {}",
                            range.label()
                        ));
                    }
                    Some(max) if max != next.min => {
                        return invalid(format!(
                            "price range {} must be followed by a range starting at {max}, found {}",
                            range.label(),
                            next.label()
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }
}
