use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, path::PathBuf, time::Duration};
use tracing::{debug, instrument};

use crate::{
    config::FeedConfig,
    error::{Feed, Result, WeatherError},
};

/// Raw payload access for the two upstream feeds.
#[async_trait]
pub trait FeedSource: Send + Sync + Debug {
    /// The "today" JSON document.
    async fn fetch_today(&self) -> Result<String>;

    /// The forecast XML document, undecoded.
    async fn fetch_forecast(&self) -> Result<Vec<u8>>;
}

/// HTTP client for the meteoromania.ro feeds.
#[derive(Debug, Clone)]
pub struct MeteoRomaniaClient {
    today_url: String,
    forecast_url: String,
    http: Client,
}

impl MeteoRomaniaClient {
    pub fn new(feeds: &FeedConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = feeds.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| WeatherError::Fetch(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            today_url: feeds.today_url.clone(),
            forecast_url: feeds.forecast_url.clone(),
            http,
        })
    }

    async fn get(&self, feed: Feed, url: &str) -> Result<reqwest::Response> {
        let res = self.http.get(url).send().await.map_err(|e| {
            WeatherError::Fetch(format!("Failed to send request for the {feed} feed: {e}"))
        })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(WeatherError::Fetch(format!(
                "{feed} feed request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(res)
    }
}

#[async_trait]
impl FeedSource for MeteoRomaniaClient {
    #[instrument(skip(self), fields(url = %self.today_url))]
    async fn fetch_today(&self) -> Result<String> {
        let body = self
            .get(Feed::Today, &self.today_url)
            .await?
            .text()
            .await
            .map_err(|e| WeatherError::Fetch(format!("Failed to read today feed body: {e}")))?;

        debug!(bytes = body.len(), "fetched today feed");
        Ok(body)
    }

    #[instrument(skip(self), fields(url = %self.forecast_url))]
    async fn fetch_forecast(&self) -> Result<Vec<u8>> {
        // Raw bytes: the feed's declared charset is not trusted.
        let body = self
            .get(Feed::Forecast, &self.forecast_url)
            .await?
            .bytes()
            .await
            .map_err(|e| WeatherError::Fetch(format!("Failed to read forecast feed body: {e}")))?;

        debug!(bytes = body.len(), "fetched forecast feed");
        Ok(body.to_vec())
    }
}

/// Reads both payloads from local files.
#[derive(Debug, Clone)]
pub struct FileFeed {
    today: PathBuf,
    forecast: PathBuf,
}

impl FileFeed {
    pub fn new(today: impl Into<PathBuf>, forecast: impl Into<PathBuf>) -> Self {
        Self { today: today.into(), forecast: forecast.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    async fn fetch_today(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.today).await.map_err(|e| {
            WeatherError::Fetch(format!("Failed to read {}: {e}", self.today.display()))
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn fetch_forecast(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.forecast).await.map_err(|e| {
            WeatherError::Fetch(format!("Failed to read {}: {e}", self.forecast.display()))
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
