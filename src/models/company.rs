use serde::Serialize;

/// A listed company, keyed by its unique ticker symbol. Tickers are
/// lowercased on ingest and the row is created lazily on first ingest.
#[derive(Debug, Clone, Serialize)]
pub struct Company {
    pub id: i64,
    pub ticker: String,
}
