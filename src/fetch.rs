use crate::error::EpgError;
use log::{debug, info, warn};
use reqwest::Client;
use std::time::Duration;

/// The network seam every channel goes through.
pub(crate) trait Fetcher {
    /// Body of a GET; any non-success status is an error.
    async fn text(&self, url: &str) -> Result<String, EpgError>;

    /// Body of a GET, or `None` when the server answers with a non-success
    /// status. Transport failures are still errors.
    async fn text_if_ok(&self, url: &str) -> Result<Option<String>, EpgError>;
}

pub(crate) struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub(crate) fn new(timeout_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpFetcher { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn text(&self, url: &str) -> Result<String, EpgError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| EpgError::fetch(url, e))?;
        response.text().await.map_err(|e| EpgError::fetch(url, e))
    }

    async fn text_if_ok(&self, url: &str) -> Result<Option<String>, EpgError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EpgError::fetch(url, e))?;
        let status = response.status();
        info!("Status code: {}", status.as_u16());
        if !status.is_success() {
            warn!("Request to {url} failed with {status}");
            return Ok(None);
        }
        Ok(Some(response.text().await.map_err(|e| EpgError::fetch(url, e))?))
    }
}
