pub mod database;
pub mod extractor;
pub mod fetcher;
pub mod ingest;
pub mod source;

pub use database::{database_exists, Store};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use ingest::{ingest_tickers, TaskStatus};
