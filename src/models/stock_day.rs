use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One day of price data for a company's stock. Prices are fixed-point
/// decimals with 4 fractional digits; (company, date) is unique.
#[derive(Debug, Clone, Serialize)]
pub struct StockDay {
    pub id: i64,
    pub company_id: i64,
    pub created_date: NaiveDate,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub volume: u64,
}

/// A freshly normalized price record, ready for dedup and insertion.
#[derive(Debug, Clone)]
pub struct NewStockDay {
    pub created_date: NaiveDate,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub volume: u64,
}

/// Field-wise signed price difference between two stock days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricesDiff {
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
}

impl StockDay {
    /// Signed difference `end - self` for every price field.
    pub fn prices_diff(&self, end: &StockDay) -> PricesDiff {
        PricesDiff {
            open_price: end.open_price - self.open_price,
            close_price: end.close_price - self.close_price,
            high_price: end.high_price - self.high_price,
            low_price: end.low_price - self.low_price,
        }
    }
}

/// Price field selector for the analytics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            other => Err(Error::InvalidInput(format!(
                "Unknown price type '{}', expected one of: open, high, low, close",
                other
            ))),
        }
    }

    pub fn of(&self, day: &StockDay) -> Decimal {
        match self {
            PriceField::Open => day.open_price,
            PriceField::High => day.high_price,
            PriceField::Low => day.low_price,
            PriceField::Close => day.close_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn day(open: &str, close: &str, high: &str, low: &str) -> StockDay {
        StockDay {
            id: 0,
            company_id: 1,
            created_date: NaiveDate::from_ymd_opt(2018, 12, 1).unwrap(),
            open_price: Decimal::from_str(open).unwrap(),
            close_price: Decimal::from_str(close).unwrap(),
            high_price: Decimal::from_str(high).unwrap(),
            low_price: Decimal::from_str(low).unwrap(),
            volume: 1000,
        }
    }

    #[test]
    fn test_prices_diff_fields() {
        let start = day("110", "111", "112", "113");
        let end = day("115", "116", "117", "118");

        let diff = start.prices_diff(&end);
        assert_eq!(diff.open_price, Decimal::from(5));
        assert_eq!(diff.close_price, Decimal::from(5));
        assert_eq!(diff.high_price, Decimal::from(5));
        assert_eq!(diff.low_price, Decimal::from(5));
    }

    #[test]
    fn test_prices_diff_antisymmetric() {
        let a = day("110.5", "98.2", "120.1", "97.0");
        let b = day("108.3", "99.9", "118.4", "96.5");

        let forward = a.prices_diff(&b);
        let backward = b.prices_diff(&a);
        assert_eq!(forward.open_price, -backward.open_price);
        assert_eq!(forward.close_price, -backward.close_price);
        assert_eq!(forward.high_price, -backward.high_price);
        assert_eq!(forward.low_price, -backward.low_price);
    }

    #[test]
    fn test_price_field_parse() {
        assert_eq!(PriceField::parse("open").unwrap(), PriceField::Open);
        assert_eq!(PriceField::parse("close").unwrap(), PriceField::Close);
        assert!(PriceField::parse("median").is_err());
    }
}
