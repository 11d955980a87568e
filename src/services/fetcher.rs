use std::future::Future;
use std::time::Duration;

use crate::constants;
use crate::error::{Error, Result};

/// One HTTP GET per (resource path, optional page). Implementations must not
/// retry; a failure is fatal to the task that owns the fetch.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, path: &str, page: Option<u32>) -> impl Future<Output = Result<String>> + Send;
}

/// Fetcher for symbol pages rooted at the configured base URL.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: constants::base_url(),
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, path: &str, page: Option<u32>) -> impl Future<Output = Result<String>> + Send {
        let url = format!("{}{}", self.base_url, path);
        let client = self.client.clone();

        async move {
            let mut request = client.get(&url);
            if let Some(page) = page {
                request = request.query(&[("page", page)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Network(format!("GET {} returned {}", url, status)));
            }

            Ok(response.text().await?)
        }
    }
}
