use std::fmt;

use futures::future::join_all;
use tracing::{error, info};

use crate::constants::MAX_PAGES;
use crate::error::Result;
use crate::models::{NewStockDay, NewTrade};
use crate::services::source::{self, SourceKind, SourceSpec};
use crate::services::{extractor, PageFetcher, Store};

/// Terminal status of one (ticker, source-type) ingest task. A task moves
/// pending -> parsing -> one of these; the status is its only output beyond
/// persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Parsed,
    NotFound,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Parsed => write!(f, "Parsed"),
            TaskStatus::NotFound => write!(f, "Not Found"),
            TaskStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Drop the table header from concatenated page rows: always one leading
/// row, and a second one when its first cell carries no embedded newline
/// (the secondary-header heuristic some sources require).
fn strip_header(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    if rows.is_empty() {
        return rows;
    }
    rows.remove(0);

    let secondary_header = rows
        .first()
        .is_some_and(|row| !row.first().is_some_and(|cell| cell.contains('\n')));
    if secondary_header && !rows.is_empty() {
        rows.remove(0);
    }

    rows
}

/// Fetch page 1, follow pagination up to the page cap when enabled, and
/// return the concatenated data rows with the header stripped.
pub async fn load_table<F: PageFetcher>(
    fetcher: &F,
    path: &str,
    paginated: bool,
) -> Result<Vec<Vec<String>>> {
    let html = fetcher.fetch(path, None).await?;
    let mut rows = extractor::extract_rows(&html)?;

    if paginated {
        // Absent indicator means a single page, not an error.
        if let Some(last_page) = extractor::last_page(&html) {
            for page in 2..=last_page.min(MAX_PAGES) {
                let page_html = fetcher.fetch(path, Some(page)).await?;
                rows.extend(extractor::extract_rows(&page_html)?);
            }
        }
    }

    Ok(strip_header(rows))
}

async fn run_task_inner<F: PageFetcher>(
    fetcher: &F,
    store: &Store,
    spec: &SourceSpec,
    ticker: &str,
) -> Result<TaskStatus> {
    let path = format!("{}/{}", ticker, spec.url_suffix);
    let rows = load_table(fetcher, &path, spec.paginated).await?;

    if rows.is_empty() {
        return Ok(TaskStatus::NotFound);
    }

    let company = store.get_or_create_company(ticker).await?;

    match spec.kind {
        SourceKind::Prices => {
            let days: Vec<NewStockDay> = rows
                .iter()
                .map(|row| source::normalize_price_row(row))
                .collect::<Result<_>>()?;
            store.import_stock_days(company.id, days).await?;
        }
        SourceKind::Trades => {
            let mut trades: Vec<NewTrade> = Vec::with_capacity(rows.len());
            for row in &rows {
                trades.push(source::normalize_trade_row(row, store).await?);
            }
            store.import_trades(company.id, trades).await?;
        }
    }

    Ok(TaskStatus::Parsed)
}

/// Run one ingest task end to end. Fetch and coercion errors are fatal to
/// this task only; they surface as a `Failed` status, never as a panic or a
/// partial import.
pub async fn run_task<F: PageFetcher>(
    fetcher: &F,
    store: &Store,
    spec: &SourceSpec,
    ticker: &str,
) -> TaskStatus {
    match run_task_inner(fetcher, store, spec, ticker).await {
        Ok(status) => status,
        Err(e) => {
            error!(ticker = ticker, source = spec.url_suffix, error = %e, "Ingest task failed");
            TaskStatus::Failed
        }
    }
}

/// One full pass of a single source type across all tickers: tasks are
/// spawned in groups of the pool size, each group joined before the next
/// starts. Statuses come back in input ticker order.
async fn run_wave<F>(
    fetcher: &F,
    store: &Store,
    spec: &'static SourceSpec,
    tickers: &[String],
    max_workers: usize,
) -> Vec<(String, TaskStatus)>
where
    F: PageFetcher + Clone + 'static,
{
    let max_workers = max_workers.max(1);
    let mut statuses = Vec::with_capacity(tickers.len());

    for group in tickers.chunks(max_workers) {
        let tasks: Vec<_> = group
            .iter()
            .map(|ticker| {
                let fetcher = fetcher.clone();
                let store = store.clone();
                let ticker = ticker.clone();
                tokio::spawn(async move {
                    let status = run_task(&fetcher, &store, spec, &ticker).await;
                    (ticker, status)
                })
            })
            .collect();

        for result in join_all(tasks).await {
            match result {
                Ok(entry) => statuses.push(entry),
                Err(e) => {
                    error!(error = %e, "Task join error");
                }
            }
        }
    }

    statuses
}

/// Ingest prices and trades for a ticker list: the price wave runs to
/// completion across every ticker, then the trade wave. Statuses are logged
/// in original ticker order once each wave finishes.
pub async fn ingest_tickers<F>(
    fetcher: &F,
    store: &Store,
    tickers: &[String],
    max_workers: usize,
) -> Vec<(String, TaskStatus)>
where
    F: PageFetcher + Clone + 'static,
{
    info!("Parsing stock prices...");
    let price_statuses = run_wave(fetcher, store, &source::PRICES, tickers, max_workers).await;
    for (ticker, status) in &price_statuses {
        info!("{} - {}", ticker.to_uppercase(), status);
    }

    info!("Parsing trades...");
    let trade_statuses = run_wave(fetcher, store, &source::TRADES, tickers, max_workers).await;
    for (ticker, status) in &trade_statuses {
        info!("{} - {}", ticker.to_uppercase(), status);
    }

    info!("Done.");

    let mut statuses = price_statuses;
    statuses.extend(trade_statuses);
    statuses
}
