use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{NewStockDay, NewTrade};
use crate::services::Store;
use crate::utils::{parse_date, parse_int};

/// The two source types share one fetch/extract/paginate pipeline and
/// differ only in this descriptor: URL suffix, pagination flag and the
/// ordered column list each raw row is zipped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Prices,
    Trades,
}

pub struct SourceSpec {
    pub kind: SourceKind,
    pub url_suffix: &'static str,
    pub paginated: bool,
    /// Number of leading columns consumed per row; extra columns are
    /// ignored, shorter rows are a parse error.
    pub field_count: usize,
}

/// Historical daily prices: single page, columns
/// (date, open, high, low, close, volume).
pub const PRICES: SourceSpec = SourceSpec {
    kind: SourceKind::Prices,
    url_suffix: "historical",
    paginated: false,
    field_count: 6,
};

/// Insider trades: paginated, columns (insider, relation, last_date,
/// transaction_type, owner_type, traded_shares, last_price, held_shares).
pub const TRADES: SourceSpec = SourceSpec {
    kind: SourceKind::Trades,
    url_suffix: "insider-trades",
    paginated: true,
    field_count: 8,
};

fn check_width(row: &[String], expected: usize) -> Result<()> {
    if row.len() < expected {
        return Err(Error::Parse(format!(
            "Row has {} columns, expected at least {}",
            row.len(),
            expected
        )));
    }
    Ok(())
}

fn parse_price(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Parse(format!("Invalid price '{}': {}", value, e)))
}

/// Map a raw price row onto a typed record. Any coercion failure aborts the
/// owning ingest task.
pub fn normalize_price_row(row: &[String]) -> Result<NewStockDay> {
    check_width(row, PRICES.field_count)?;

    Ok(NewStockDay {
        created_date: parse_date(&row[0])?,
        open_price: parse_price(&row[1])?,
        high_price: parse_price(&row[2])?,
        low_price: parse_price(&row[3])?,
        close_price: parse_price(&row[4])?,
        volume: parse_int(&row[5])?,
    })
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Map a raw trade row onto a typed record, resolving the insider by
/// get-or-create on its exact name. An empty last_price cell leaves the
/// field unset rather than writing a zero.
pub async fn normalize_trade_row(row: &[String], store: &Store) -> Result<NewTrade> {
    check_width(row, TRADES.field_count)?;

    let insider = store.get_or_create_insider(&row[0]).await?;
    let last_price = match row[6].as_str() {
        "" => None,
        value => Some(parse_price(value)?),
    };

    Ok(NewTrade {
        insider_id: insider.id,
        relation: optional(&row[1]),
        last_date: parse_date(&row[2])?,
        transaction_type: optional(&row[3]),
        owner_type: optional(&row[4]),
        traded_shares: parse_int(&row[5])?,
        last_price,
        held_shares: parse_int(&row[7])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_normalize_price_row() {
        let record = normalize_price_row(&row(&[
            "11/18/2018",
            "120.30",
            "132.10",
            "119.2",
            "122.1",
            "300,000",
        ]))
        .unwrap();

        assert_eq!(
            record.created_date,
            NaiveDate::from_ymd_opt(2018, 11, 18).unwrap()
        );
        assert_eq!(record.open_price, Decimal::from_str("120.30").unwrap());
        assert_eq!(record.high_price, Decimal::from_str("132.10").unwrap());
        assert_eq!(record.low_price, Decimal::from_str("119.2").unwrap());
        assert_eq!(record.close_price, Decimal::from_str("122.1").unwrap());
        assert_eq!(record.volume, 300000);
    }

    #[test]
    fn test_normalize_price_row_ignores_extra_columns() {
        let record = normalize_price_row(&row(&[
            "11/18/2018",
            "1",
            "2",
            "3",
            "4",
            "5",
            "surplus",
        ]))
        .unwrap();
        assert_eq!(record.volume, 5);
    }

    #[test]
    fn test_normalize_price_row_short_row_is_error() {
        assert!(normalize_price_row(&row(&["11/18/2018", "120.30"])).is_err());
    }

    #[test]
    fn test_normalize_price_row_bad_volume_is_error() {
        let result = normalize_price_row(&row(&[
            "11/18/2018",
            "120.30",
            "132.10",
            "119.2",
            "122.1",
            "lots",
        ]));
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
