/// Default root for symbol pages. Override with the `STOCKWATCH_BASE_URL`
/// environment variable (useful for pointing tests at a local server).
pub const DEFAULT_BASE_URL: &str = "http://www.nasdaq.com/symbol/";

/// Hard cap on the number of pages fetched per paginated source. A source
/// reporting a larger last page is truncated, not rejected.
pub const MAX_PAGES: u32 = 10;

/// Worker pool size used when the ingest command does not specify one.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default SQLite database path.
pub const DEFAULT_DATABASE: &str = "stockwatch.db";

/// Default API server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Base URL for symbol pages, honoring the environment override.
pub fn base_url() -> String {
    std::env::var("STOCKWATCH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}
