//! Database query helpers for listing and searching transactions.

use rusqlite::{Connection, named_params};

use crate::{Error, month::MonthFilter, pagination::Pagination};

use super::core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row};

/// The SQL condition that restricts rows to the month bound to `:month`, or
/// to every row when `:month` is NULL.
///
/// Characters 6 and 7 of a stored `YYYY-MM-DD...` date are the month number.
/// The leading ten characters must also be a real calendar date: SQLite's
/// `date()` gives NULL for malformed text and rolls impossible days such as
/// `2024-02-30` over into the next month, so neither survives the
/// round trip.
pub(crate) const MONTH_CONDITION: &str = "(:month IS NULL OR (\
    substr(date_of_sale, 6, 2) = :month \
    AND date(substr(date_of_sale, 1, 10)) = substr(date_of_sale, 1, 10)))";

/// Get the value to bind to `:month` in [MONTH_CONDITION].
pub(crate) fn month_param(month: Option<MonthFilter>) -> Option<String> {
    month.map(|month| month.padded_number())
}

/// Get every transaction sold in `month`, or all transactions if `month` is
/// `None`, ordered by ID.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn get_transactions(
    month: Option<MonthFilter>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let month = month_param(month);

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
            WHERE {MONTH_CONDITION} \
            ORDER BY id ASC"
        ))?
        .query_map(named_params! { ":month": month }, map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get one page of the transactions sold in `month` whose title or
/// description contains `search`, or whose price does when written as
/// text.
///
/// Matching ignores ASCII case. An empty `search` matches every transaction.
/// Results keep their stored order.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn search_transactions(
    month: Option<MonthFilter>,
    search: &str,
    pagination: Pagination,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let month = month_param(month);
    let pattern = format!("%{}%", escape_like(search));
    let limit = i64::try_from(pagination.per_page).unwrap_or(i64::MAX);
    let offset = i64::try_from(pagination.offset()).unwrap_or(i64::MAX);

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
            WHERE {MONTH_CONDITION} \
            AND (title LIKE :pattern ESCAPE '\\' \
                OR description LIKE :pattern ESCAPE '\\' \
                OR CAST(price AS TEXT) LIKE :pattern ESCAPE '\\') \
            ORDER BY id ASC \
            LIMIT :limit OFFSET :offset"
        ))?
        .query_map(
            named_params! {
                ":month": month,
                ":pattern": pattern,
                ":limit": limit,
                ":offset": offset,
            },
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Escape the LIKE wildcards in `text` so they match literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::Month;

    use crate::{
        db::initialize,
        month::MonthFilter,
        pagination::Pagination,
        transaction::{Transaction, insert_transactions},
    };

    use super::{escape_like, get_transactions, search_transactions};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn first_page(per_page: u64) -> Pagination {
        Pagination { page: 1, per_page }
    }

    fn insert_test_transactions(conn: &Connection) {
        insert_transactions(
            &[
                Transaction::build("Wireless Mouse", 25.5, "electronics", "2022-03-05T10:00:00+05:30")
                    .description("A quiet mouse")
                    .sold(true),
                Transaction::build("Gold Ring", 695.0, "jewelery", "2022-03-20")
                    .description("Solid gold"),
                Transaction::build("Cotton Jacket", 55.99, "men's clothing", "2021-04-11")
                    .description("Great for spring, 100% cotton"),
                Transaction::build("USB Drive", 64.0, "electronics", "2021-03-01")
                    .description("Fast_storage"),
            ],
            conn,
        )
        .expect("Could not insert test transactions");
    }

    #[test]
    fn gets_all_transactions_without_month() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = get_transactions(None, &conn).unwrap();

        assert_eq!(got.len(), 4);
        assert!(got.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn gets_transactions_in_month_of_any_year() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = get_transactions(Some(MonthFilter::new(Month::March)), &conn).unwrap();

        let titles: Vec<_> = got.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Wireless Mouse", "Gold Ring", "USB Drive"]);
    }

    #[test]
    fn gets_nothing_for_month_without_sales() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = get_transactions(Some(MonthFilter::new(Month::July)), &conn).unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn search_matches_title_case_insensitively() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = search_transactions(None, "mouse", first_page(10), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Wireless Mouse");
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let leading = search_transactions(None, " mouse", first_page(10), &conn).unwrap();
        let trailing = search_transactions(None, "mouse ", first_page(10), &conn).unwrap();

        assert_eq!(leading.len(), 1);
        assert!(trailing.is_empty());
    }

    #[test]
    fn month_filter_skips_impossible_dates() {
        let conn = get_test_connection();
        insert_transactions(
            &[
                Transaction::build("Real", 1.0, "toys", "2024-02-05"),
                Transaction::build("Thirtieth", 1.0, "toys", "2024-02-30"),
                Transaction::build("Garbled", 1.0, "toys", "2024-02-xx"),
            ],
            &conn,
        )
        .unwrap();

        let listed = get_transactions(Some(MonthFilter::new(Month::February)), &conn).unwrap();
        let searched = search_transactions(
            Some(MonthFilter::new(Month::February)),
            "",
            first_page(10),
            &conn,
        )
        .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Real");
        assert_eq!(searched, listed);
    }

    #[test]
    fn search_matches_description() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = search_transactions(None, "solid", first_page(10), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Gold Ring");
    }

    #[test]
    fn search_matches_price_text() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = search_transactions(None, "55.99", first_page(10), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Cotton Jacket");
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let percent = search_transactions(None, "100%", first_page(10), &conn).unwrap();
        let underscore = search_transactions(None, "_", first_page(10), &conn).unwrap();

        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].title, "Cotton Jacket");
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].title, "USB Drive");
    }

    #[test]
    fn search_combines_with_month() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = search_transactions(
            Some(MonthFilter::new(Month::March)),
            "electronics drive",
            first_page(10),
            &conn,
        )
        .unwrap();
        assert!(got.is_empty());

        let got = search_transactions(
            Some(MonthFilter::new(Month::April)),
            "",
            first_page(10),
            &conn,
        )
        .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Cotton Jacket");
    }

    #[test]
    fn second_page_returns_remainder_in_order() {
        let conn = get_test_connection();
        let batch: Vec<_> = (1..=15)
            .map(|i| Transaction::build(&format!("item #{i}"), i as f64, "electronics", "2022-03-01"))
            .collect();
        insert_transactions(&batch, &conn).unwrap();

        let got = search_transactions(
            Some(MonthFilter::new(Month::March)),
            "",
            Pagination {
                page: 2,
                per_page: 10,
            },
            &conn,
        )
        .unwrap();

        let titles: Vec<_> = got.iter().map(|t| t.title.clone()).collect();
        let want: Vec<_> = (11..=15).map(|i| format!("item #{i}")).collect();
        assert_eq!(titles, want);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let conn = get_test_connection();
        insert_test_transactions(&conn);

        let got = search_transactions(
            None,
            "",
            Pagination {
                page: 5,
                per_page: 10,
            },
            &conn,
        )
        .unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
