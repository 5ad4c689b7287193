//! Filtering transactions by the calendar month they were sold in.

use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

/// The leading calendar date of a `dateOfSale` string, e.g. the
/// "2021-11-27" in "2021-11-27T20:29:54+05:30".
const DATE_OF_SALE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]");

/// A calendar month used to restrict transactions to those sold in that
/// month of any year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthFilter(Month);

impl MonthFilter {
    /// Create a filter for `month`.
    pub fn new(month: Month) -> Self {
        Self(month)
    }

    /// Parse a month from a full English month name, e.g. "March", or a
    /// month number from 1 to 12 with or without zero padding, e.g. "3" or
    /// "03".
    ///
    /// Month names are case-sensitive. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit()) {
            return raw
                .parse::<u8>()
                .ok()
                .and_then(|number| Month::try_from(number).ok())
                .map(Self);
        }

        let month = match raw {
            "January" => Month::January,
            "February" => Month::February,
            "March" => Month::March,
            "April" => Month::April,
            "May" => Month::May,
            "June" => Month::June,
            "July" => Month::July,
            "August" => Month::August,
            "September" => Month::September,
            "October" => Month::October,
            "November" => Month::November,
            "December" => Month::December,
            _ => return None,
        };

        Some(Self(month))
    }

    /// Read the month filter from an optional query parameter.
    ///
    /// A missing, empty or unrecognised value means "no filter" rather than
    /// an error.
    pub fn from_query(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;

        if raw.trim().is_empty() {
            return None;
        }

        let filter = Self::parse(raw);

        if filter.is_none() {
            tracing::debug!("Ignoring unrecognised month filter {raw:?}");
        }

        filter
    }

    /// The month this filter selects.
    pub fn month(&self) -> Month {
        self.0
    }

    /// The zero-padded month number, e.g. "03" for March.
    ///
    /// This is the text that appears in characters 6 and 7 of a stored
    /// `dateOfSale`.
    pub fn padded_number(&self) -> String {
        format!("{:02}", self.0 as u8)
    }

    /// Whether a transaction sold on `date_of_sale` falls in this month.
    ///
    /// Dates that cannot be parsed never match.
    pub fn matches(&self, date_of_sale: &str) -> bool {
        month_of_sale(date_of_sale) == Some(self.0)
    }
}

/// Get the month component of a `dateOfSale` string.
///
/// Only the leading `YYYY-MM-DD` is read, so any time or UTC offset that
/// follows is ignored and does not shift the month.
pub fn month_of_sale(date_of_sale: &str) -> Option<Month> {
    let date_part = date_of_sale.get(..10)?;

    Date::parse(date_part, DATE_OF_SALE_FORMAT)
        .ok()
        .map(|date| date.month())
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::{MonthFilter, month_of_sale};

    #[test]
    fn parses_month_names() {
        assert_eq!(
            MonthFilter::parse("March"),
            Some(MonthFilter::new(Month::March))
        );
        assert_eq!(
            MonthFilter::parse("December"),
            Some(MonthFilter::new(Month::December))
        );
    }

    #[test]
    fn month_names_are_case_sensitive() {
        assert_eq!(MonthFilter::parse("march"), None);
        assert_eq!(MonthFilter::parse("MARCH"), None);
    }

    #[test]
    fn parses_month_numbers_with_and_without_padding() {
        assert_eq!(MonthFilter::parse("3"), Some(MonthFilter::new(Month::March)));
        assert_eq!(
            MonthFilter::parse("03"),
            Some(MonthFilter::new(Month::March))
        );
        assert_eq!(
            MonthFilter::parse("12"),
            Some(MonthFilter::new(Month::December))
        );
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert_eq!(MonthFilter::parse("0"), None);
        assert_eq!(MonthFilter::parse("13"), None);
        assert_eq!(MonthFilter::parse("-3"), None);
        assert_eq!(MonthFilter::parse("999999"), None);
    }

    #[test]
    fn bad_query_values_mean_no_filter() {
        assert_eq!(MonthFilter::from_query(None), None);
        assert_eq!(MonthFilter::from_query(Some("")), None);
        assert_eq!(MonthFilter::from_query(Some("  ")), None);
        assert_eq!(MonthFilter::from_query(Some("Marhc")), None);
        assert_eq!(
            MonthFilter::from_query(Some("March")),
            Some(MonthFilter::new(Month::March))
        );
    }

    #[test]
    fn padded_number_has_two_digits() {
        assert_eq!(MonthFilter::new(Month::March).padded_number(), "03");
        assert_eq!(MonthFilter::new(Month::November).padded_number(), "11");
    }

    #[test]
    fn reads_month_from_date_and_date_time() {
        assert_eq!(month_of_sale("2024-03-05"), Some(Month::March));
        assert_eq!(
            month_of_sale("2021-11-27T20:29:54+05:30"),
            Some(Month::November)
        );
    }

    #[test]
    fn offset_does_not_shift_month() {
        // 23:30 on the last day of January at -05:00 is February in UTC.
        assert_eq!(
            month_of_sale("2022-01-31T23:30:00-05:00"),
            Some(Month::January)
        );
    }

    #[test]
    fn unparsable_dates_have_no_month() {
        assert_eq!(month_of_sale(""), None);
        assert_eq!(month_of_sale("yesterday"), None);
        assert_eq!(month_of_sale("2024-3-5"), None);
        assert_eq!(month_of_sale("2024-13-01"), None);
    }

    #[test]
    fn matches_only_the_selected_month() {
        let march = MonthFilter::new(Month::March);

        assert!(march.matches("2024-03-05"));
        assert!(march.matches("2019-03-31T10:00:00Z"));
        assert!(!march.matches("2024-04-01"));
        assert!(!march.matches("not a date"));
    }
}
