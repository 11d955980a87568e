use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{PriceField, StockDay};

/// One point of a company's price series: the persisted record id, its date
/// and the chosen price field's value.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub id: i64,
    pub date: NaiveDate,
    pub price: Decimal,
}

/// A mutually-closest qualifying jump: `date2`'s price differs from
/// `date1`'s by at least the threshold, no closer qualifying point exists
/// between them on either side, and `diff` is signed (`price2 - price1`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePeriod {
    pub id1: i64,
    pub price1: Decimal,
    pub date1: NaiveDate,
    pub id2: i64,
    pub price2: Decimal,
    pub date2: NaiveDate,
    pub diff: Decimal,
}

/// Project a date-ascending stock day series onto one price field.
pub fn period_points(days: &[StockDay], field: PriceField) -> Vec<PricePoint> {
    days.iter()
        .map(|day| PricePoint {
            id: day.id,
            date: day.created_date,
            price: field.of(day),
        })
        .collect()
}

/// Minimal covering set of price jumps over a date-ascending series.
///
/// A pair (i, j) with i < j qualifies when |price_j - price_i| >= min_diff.
/// Only mutually-closest qualifying pairs are kept: j must be the nearest
/// qualifying successor of i, and i the nearest qualifying predecessor of j.
/// Longer-range pairs are superseded whenever a nearer qualifying point
/// exists on either side.
pub fn min_price_periods(points: &[PricePoint], min_diff: Decimal) -> Vec<PricePeriod> {
    let n = points.len();
    let mut pred: Vec<Option<usize>> = vec![None; n];
    let mut succ: Vec<Option<usize>> = vec![None; n];

    for j in 0..n {
        for i in 0..j {
            let diff = points[j].price - points[i].price;
            if diff.abs() >= min_diff {
                // i ascends, so the last assignment is the greatest i.
                pred[j] = Some(i);
                // j ascends, so the first assignment is the least j.
                if succ[i].is_none() {
                    succ[i] = Some(j);
                }
            }
        }
    }

    (0..n)
        .filter_map(|i| {
            let j = succ[i]?;
            if pred[j] != Some(i) {
                return None;
            }
            Some(PricePeriod {
                id1: points[i].id,
                price1: points[i].price,
                date1: points[i].date,
                id2: points[j].id,
                price2: points[j].price,
                date2: points[j].date,
                diff: points[j].price - points[i].price,
            })
        })
        .collect()
}
