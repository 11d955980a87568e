use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Company, Insider, NewStockDay, NewTrade, StockDay, Trade, TradeKey};
use crate::utils::slugify;

/// SQLite store for companies, stock days, insiders and trades.
///
/// Prices are fixed-point decimals and SQLite has no decimal type, so price
/// columns are TEXT and converted at the row boundary.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and initialize the schema.
    pub async fn new(database_path: &Path) -> Result<Self> {
        info!("Opening database at: {:?}", database_path);

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(connect_options).await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let tables = [
            r#"
            CREATE TABLE IF NOT EXISTS company (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS stock_day (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL REFERENCES company(id) ON DELETE CASCADE,
                created_date DATE NOT NULL,
                open_price TEXT NOT NULL,
                close_price TEXT NOT NULL,
                high_price TEXT NOT NULL,
                low_price TEXT NOT NULL,
                volume INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS insider (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                slug TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS trade (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL REFERENCES company(id) ON DELETE CASCADE,
                insider_id INTEGER NOT NULL REFERENCES insider(id) ON DELETE CASCADE,
                last_date DATE NOT NULL,
                relation TEXT,
                transaction_type TEXT,
                owner_type TEXT,
                last_price TEXT,
                traded_shares INTEGER NOT NULL,
                held_shares INTEGER NOT NULL
            )
            "#,
        ];

        for table in tables {
            sqlx::query(table).execute(&self.pool).await?;
        }

        let indexes = [
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_company_ticker ON company(ticker)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_stock_day_unique ON stock_day(company_id, created_date)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_insider_name ON insider(name)",
            "CREATE INDEX IF NOT EXISTS idx_trade_company_date ON trade(company_id, last_date DESC)",
        ];

        for index in indexes {
            sqlx::query(index).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Get-or-create a company by ticker. Upsert-then-select, so two
    /// concurrent tasks for the same ticker converge on one row.
    pub async fn get_or_create_company(&self, ticker: &str) -> Result<Company> {
        sqlx::query("INSERT INTO company (ticker) VALUES (?1) ON CONFLICT(ticker) DO NOTHING")
            .bind(ticker)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT id, ticker FROM company WHERE ticker = ?1")
            .bind(ticker)
            .fetch_one(&self.pool)
            .await?;

        Ok(Company {
            id: row.try_get("id").map_err(db_err)?,
            ticker: row.try_get("ticker").map_err(db_err)?,
        })
    }

    pub async fn get_company(&self, ticker: &str) -> Result<Option<Company>> {
        let row = sqlx::query("SELECT id, ticker FROM company WHERE ticker = ?1")
            .bind(ticker)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Company {
                id: row.try_get("id").map_err(db_err)?,
                ticker: row.try_get("ticker").map_err(db_err)?,
            })
        })
        .transpose()
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let rows = sqlx::query("SELECT id, ticker FROM company ORDER BY ticker")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Company {
                    id: row.try_get("id").map_err(db_err)?,
                    ticker: row.try_get("ticker").map_err(db_err)?,
                })
            })
            .collect()
    }

    /// Get-or-create an insider by exact name. The slug is derived from the
    /// name only when the row is first created.
    pub async fn get_or_create_insider(&self, name: &str) -> Result<Insider> {
        sqlx::query("INSERT INTO insider (name, slug) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .bind(slugify(name))
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT id, name, slug FROM insider WHERE name = ?1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(Insider {
            id: row.try_get("id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            slug: row.try_get("slug").map_err(db_err)?,
        })
    }

    /// Dedup-import stock days for one company: filter out dates already
    /// persisted (and duplicates within the batch), then insert the
    /// survivors in a single transaction. Returns the number inserted.
    pub async fn import_stock_days(
        &self,
        company_id: i64,
        days: Vec<NewStockDay>,
    ) -> Result<usize> {
        let rows = sqlx::query("SELECT created_date FROM stock_day WHERE company_id = ?1")
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        let mut seen: HashSet<NaiveDate> = rows
            .into_iter()
            .map(|row| row.try_get("created_date").map_err(db_err))
            .collect::<Result<_>>()?;

        let survivors: Vec<NewStockDay> = days
            .into_iter()
            .filter(|day| seen.insert(day.created_date))
            .collect();

        let mut tx = self.pool.begin().await?;
        for day in &survivors {
            sqlx::query(
                r#"
                INSERT INTO stock_day
                    (company_id, created_date, open_price, close_price, high_price, low_price, volume)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(company_id)
            .bind(day.created_date)
            .bind(day.open_price.to_string())
            .bind(day.close_price.to_string())
            .bind(day.high_price.to_string())
            .bind(day.low_price.to_string())
            .bind(day.volume as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(survivors.len())
    }

    /// Dedup-import trades for one company by identity key
    /// (insider, relation, last_date, transaction_type, traded_shares).
    /// The comparison set is scoped to the owning company.
    pub async fn import_trades(&self, company_id: i64, trades: Vec<NewTrade>) -> Result<usize> {
        let rows = sqlx::query(
            r#"
            SELECT insider_id, relation, last_date, transaction_type, traded_shares
            FROM trade WHERE company_id = ?1
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        let mut seen: HashSet<TradeKey> = rows
            .into_iter()
            .map(|row| {
                Ok(TradeKey {
                    insider_id: row.try_get("insider_id").map_err(db_err)?,
                    relation: row.try_get("relation").map_err(db_err)?,
                    last_date: row.try_get("last_date").map_err(db_err)?,
                    transaction_type: row.try_get("transaction_type").map_err(db_err)?,
                    traded_shares: row.try_get::<i64, _>("traded_shares").map_err(db_err)? as u64,
                })
            })
            .collect::<Result<_>>()?;

        let survivors: Vec<NewTrade> = trades
            .into_iter()
            .filter(|trade| seen.insert(trade.identity_key()))
            .collect();

        let mut tx = self.pool.begin().await?;
        for trade in &survivors {
            sqlx::query(
                r#"
                INSERT INTO trade
                    (company_id, insider_id, last_date, relation, transaction_type,
                     owner_type, last_price, traded_shares, held_shares)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(company_id)
            .bind(trade.insider_id)
            .bind(trade.last_date)
            .bind(&trade.relation)
            .bind(&trade.transaction_type)
            .bind(&trade.owner_type)
            .bind(trade.last_price.map(|p| p.to_string()))
            .bind(trade.traded_shares as i64)
            .bind(trade.held_shares as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(survivors.len())
    }

    /// Stock days for a company, newest first (the list endpoint order).
    pub async fn stock_days_desc(&self, company_id: i64) -> Result<Vec<StockDay>> {
        self.query_stock_days(company_id, "DESC", None).await
    }

    /// Full price series in ascending date order, as the analytics engine
    /// expects.
    pub async fn stock_days_asc(&self, company_id: i64) -> Result<Vec<StockDay>> {
        self.query_stock_days(company_id, "ASC", None).await
    }

    /// Price series restricted to an inclusive date range, ascending.
    pub async fn stock_days_in_range(
        &self,
        company_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<StockDay>> {
        self.query_stock_days(company_id, "ASC", Some((date_from, date_to)))
            .await
    }

    async fn query_stock_days(
        &self,
        company_id: i64,
        order: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<StockDay>> {
        let base = "SELECT id, company_id, created_date, open_price, close_price, \
                    high_price, low_price, volume FROM stock_day WHERE company_id = ?1";

        let rows = match range {
            Some((from, to)) => {
                let sql = format!(
                    "{} AND created_date >= ?2 AND created_date <= ?3 ORDER BY created_date {}",
                    base, order
                );
                sqlx::query(&sql)
                    .bind(company_id)
                    .bind(from)
                    .bind(to)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{} ORDER BY created_date {}", base, order);
                sqlx::query(&sql)
                    .bind(company_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(row_to_stock_day).collect()
    }

    /// Trades for a company, newest first, optionally filtered by insider
    /// slug.
    pub async fn trades(&self, company_id: i64, insider_slug: Option<&str>) -> Result<Vec<Trade>> {
        let base = r#"
            SELECT t.id, t.company_id, t.last_date, t.relation, t.transaction_type,
                   t.owner_type, t.last_price, t.traded_shares, t.held_shares,
                   i.id AS insider_id, i.name AS insider_name, i.slug AS insider_slug
            FROM trade t
            JOIN insider i ON i.id = t.insider_id
            WHERE t.company_id = ?1
        "#;

        let rows = match insider_slug {
            Some(slug) => {
                let sql = format!("{} AND i.slug = ?2 ORDER BY t.last_date DESC", base);
                sqlx::query(&sql)
                    .bind(company_id)
                    .bind(slug)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{} ORDER BY t.last_date DESC", base);
                sqlx::query(&sql)
                    .bind(company_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(row_to_trade).collect()
    }
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::Database(err.to_string())
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| AppError::Database(format!("Invalid stored decimal '{}': {}", value, e)))
}

fn row_to_stock_day(row: SqliteRow) -> Result<StockDay> {
    Ok(StockDay {
        id: row.try_get("id").map_err(db_err)?,
        company_id: row.try_get("company_id").map_err(db_err)?,
        created_date: row.try_get("created_date").map_err(db_err)?,
        open_price: parse_decimal(&row.try_get::<String, _>("open_price").map_err(db_err)?)?,
        close_price: parse_decimal(&row.try_get::<String, _>("close_price").map_err(db_err)?)?,
        high_price: parse_decimal(&row.try_get::<String, _>("high_price").map_err(db_err)?)?,
        low_price: parse_decimal(&row.try_get::<String, _>("low_price").map_err(db_err)?)?,
        volume: row.try_get::<i64, _>("volume").map_err(db_err)? as u64,
    })
}

fn row_to_trade(row: SqliteRow) -> Result<Trade> {
    let last_price = row
        .try_get::<Option<String>, _>("last_price")
        .map_err(db_err)?
        .as_deref()
        .map(parse_decimal)
        .transpose()?;

    Ok(Trade {
        id: row.try_get("id").map_err(db_err)?,
        company_id: row.try_get("company_id").map_err(db_err)?,
        insider: Insider {
            id: row.try_get("insider_id").map_err(db_err)?,
            name: row.try_get("insider_name").map_err(db_err)?,
            slug: row.try_get("insider_slug").map_err(db_err)?,
        },
        last_date: row.try_get("last_date").map_err(db_err)?,
        relation: row.try_get("relation").map_err(db_err)?,
        transaction_type: row.try_get("transaction_type").map_err(db_err)?,
        owner_type: row.try_get("owner_type").map_err(db_err)?,
        last_price,
        traded_shares: row.try_get::<i64, _>("traded_shares").map_err(db_err)? as u64,
        held_shares: row.try_get::<i64, _>("held_shares").map_err(db_err)? as u64,
    })
}

/// Check if a database file exists.
pub fn database_exists(database_path: &Path) -> bool {
    database_path.exists() && database_path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::new(&dir.path().join("test.db")).await.unwrap();
        (dir, store)
    }

    fn sample_day(date: NaiveDate, open: &str) -> NewStockDay {
        NewStockDay {
            created_date: date,
            open_price: Decimal::from_str(open).unwrap(),
            close_price: Decimal::from_str("122.1").unwrap(),
            high_price: Decimal::from_str("132.10").unwrap(),
            low_price: Decimal::from_str("119.2").unwrap(),
            volume: 300000,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_company_is_stable() {
        let (_dir, store) = test_store().await;

        let first = store.get_or_create_company("abc").await.unwrap();
        let second = store.get_or_create_company("abc").await.unwrap();
        assert_eq!(first.id, second.id);

        let other = store.get_or_create_company("xyz").await.unwrap();
        assert_ne!(first.id, other.id);
        assert_eq!(store.list_companies().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insider_slug_derived_once() {
        let (_dir, store) = test_store().await;

        let insider = store.get_or_create_insider("Jeffrey Leboski").await.unwrap();
        assert_eq!(insider.slug, "jeffrey-leboski");

        let again = store.get_or_create_insider("Jeffrey Leboski").await.unwrap();
        assert_eq!(insider.id, again.id);
    }

    #[tokio::test]
    async fn test_import_stock_days_dedup_by_date() {
        let (_dir, store) = test_store().await;
        let company = store.get_or_create_company("abc").await.unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 11, 18).unwrap();

        let inserted = store
            .import_stock_days(company.id, vec![sample_day(date, "120.30")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        // Re-importing the same date is a no-op; the stored row wins.
        let inserted = store
            .import_stock_days(company.id, vec![sample_day(date, "999.99")])
            .await
            .unwrap();
        assert_eq!(inserted, 0);

        let days = store.stock_days_asc(company.id).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].open_price, Decimal::from_str("120.30").unwrap());
        assert_eq!(days[0].volume, 300000);
    }

    #[tokio::test]
    async fn test_import_stock_days_dedup_within_batch() {
        let (_dir, store) = test_store().await;
        let company = store.get_or_create_company("abc").await.unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 11, 18).unwrap();

        let inserted = store
            .import_stock_days(
                company.id,
                vec![sample_day(date, "120.30"), sample_day(date, "121.00")],
            )
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_import_trades_identity_key() {
        let (_dir, store) = test_store().await;
        let company = store.get_or_create_company("abc").await.unwrap();
        let insider = store.get_or_create_insider("Jeffrey Leboski").await.unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 11, 18).unwrap();

        let trade = NewTrade {
            insider_id: insider.id,
            last_date: date,
            relation: Some("Dude".to_string()),
            transaction_type: Some("Incoming".to_string()),
            owner_type: Some("direct".to_string()),
            last_price: None,
            traded_shares: 1,
            held_shares: 1,
        };

        assert_eq!(
            store.import_trades(company.id, vec![trade.clone()]).await.unwrap(),
            1
        );
        // Same identity key: skipped even though owner_type differs.
        let mut same_key = trade.clone();
        same_key.owner_type = Some("indirect".to_string());
        assert_eq!(
            store.import_trades(company.id, vec![same_key]).await.unwrap(),
            0
        );

        // Different traded_shares: a new record.
        let mut other = trade.clone();
        other.traded_shares = 2;
        assert_eq!(store.import_trades(company.id, vec![other]).await.unwrap(), 1);

        // Same key under a different company is not skipped.
        let rival = store.get_or_create_company("xyz").await.unwrap();
        assert_eq!(
            store.import_trades(rival.id, vec![trade]).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_trades_filter_by_insider_slug() {
        let (_dir, store) = test_store().await;
        let company = store.get_or_create_company("abc").await.unwrap();
        let first = store.get_or_create_insider("Jeffrey Leboski").await.unwrap();
        let second = store.get_or_create_insider("Walter Sobchak").await.unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 11, 18).unwrap();

        let make = |insider_id, shares| NewTrade {
            insider_id,
            last_date: date,
            relation: None,
            transaction_type: None,
            owner_type: None,
            last_price: Some(Decimal::from_str("200.0").unwrap()),
            traded_shares: shares,
            held_shares: 10,
        };

        store
            .import_trades(company.id, vec![make(first.id, 1), make(second.id, 2)])
            .await
            .unwrap();

        let all = store.trades(company.id, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store
            .trades(company.id, Some("walter-sobchak"))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].insider.name, "Walter Sobchak");
        assert_eq!(
            filtered[0].last_price,
            Some(Decimal::from_str("200.0").unwrap())
        );
    }
}
