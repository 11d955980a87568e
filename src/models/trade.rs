use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::Insider;

/// An insider trade for a company's stock, as persisted. The insider row is
/// joined in for read queries.
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub id: i64,
    pub company_id: i64,
    pub insider: Insider,
    pub last_date: NaiveDate,
    pub relation: Option<String>,
    pub transaction_type: Option<String>,
    pub owner_type: Option<String>,
    /// Unset when the source cell was empty.
    pub last_price: Option<Decimal>,
    pub traded_shares: u64,
    pub held_shares: u64,
}

/// A freshly normalized trade record, ready for dedup and insertion.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub insider_id: i64,
    pub last_date: NaiveDate,
    pub relation: Option<String>,
    pub transaction_type: Option<String>,
    pub owner_type: Option<String>,
    pub last_price: Option<Decimal>,
    pub traded_shares: u64,
    pub held_shares: u64,
}

/// Identity key deciding whether a trade already exists for the owning
/// company: (insider, relation, last_date, transaction_type, traded_shares).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeKey {
    pub insider_id: i64,
    pub relation: Option<String>,
    pub last_date: NaiveDate,
    pub transaction_type: Option<String>,
    pub traded_shares: u64,
}

impl NewTrade {
    pub fn identity_key(&self) -> TradeKey {
        TradeKey {
            insider_id: self.insider_id,
            relation: self.relation.clone(),
            last_date: self.last_date,
            transaction_type: self.transaction_type.clone(),
            traded_shares: self.traded_shares,
        }
    }
}
