use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_MAX_WORKERS;
use crate::error::{Error, Result};
use crate::services::{ingest_tickers, HttpFetcher, Store};

pub fn run(path: PathBuf, max_workers: Option<usize>, database: PathBuf) {
    let tickers = match read_ticker_file(&path) {
        Ok(tickers) => tickers,
        Err(e) => {
            eprintln!("Error reading ticker file: {}", e);
            std::process::exit(1);
        }
    };

    if tickers.is_empty() {
        eprintln!("No tickers found in {}", path.display());
        std::process::exit(1);
    }

    println!(
        "Ingesting {} tickers into {} ({} workers)",
        tickers.len(),
        database.display(),
        max_workers.unwrap_or(DEFAULT_MAX_WORKERS)
    );

    if let Err(e) = run_ingest(tickers, max_workers, database) {
        eprintln!("Ingest failed: {}", e);
        std::process::exit(1);
    }
}

/// One ticker per line, case-insensitive, blank lines skipped.
fn read_ticker_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect())
}

fn run_ingest(tickers: Vec<String>, max_workers: Option<usize>, database: PathBuf) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Config(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let store = Store::new(&database).await?;
        let fetcher = HttpFetcher::new()?;
        ingest_tickers(
            &fetcher,
            &store,
            &tickers,
            max_workers.unwrap_or(DEFAULT_MAX_WORKERS),
        )
        .await;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_ticker_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "AAPL").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  goog  ").unwrap();
        writeln!(file, "Tsla").unwrap();

        let tickers = read_ticker_file(&path).unwrap();
        assert_eq!(tickers, vec!["aapl", "goog", "tsla"]);
    }

    #[test]
    fn test_read_ticker_file_missing() {
        assert!(read_ticker_file(Path::new("/nonexistent/tickers.txt")).is_err());
    }
}
