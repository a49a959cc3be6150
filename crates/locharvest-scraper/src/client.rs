//! HTTP client for the scrape-it.cloud Google local-results endpoint.

use std::time::Duration;

use locharvest_core::{AppConfig, PlaceRecord};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ScraperError;
use crate::retry::RetryPolicy;
use crate::types::{ScrapeRequest, ScrapeResponse};

const DEFAULT_BASE_URL: &str = "https://api.scrape-it.cloud";
const LOCALS_PATH: &str = "scrape/google/locals";
const API_KEY_HEADER: &str = "x-api-key";

/// Fetches one page of local-business results per call.
///
/// Each call is a single `POST` with a JSON body and the API key header,
/// wrapped in the client's [`RetryPolicy`]. A call either returns a fully
/// decoded page or an error; it never mutates anything beyond the network.
pub struct LocalsClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    retry: RetryPolicy,
}

impl LocalsClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout_secs, user_agent, retry)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ScraperError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute URL.
    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint: Self::endpoint_url(base_url)?,
            retry,
        })
    }

    /// Builds a client from the run's [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`LocalsClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::with_base_url(
            &config.api_key,
            &config.base_url,
            config.request_timeout_secs,
            &config.user_agent,
            RetryPolicy::new(config.max_attempts, config.retry_wait()),
        )
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches and decodes one page, retrying per the client's policy.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] on network or TLS failure.
    /// - [`ScraperError::UnexpectedStatus`] on any non-2xx status.
    /// - [`ScraperError::Deserialize`] if the body is not JSON or the records
    ///   do not match the expected shape.
    /// - [`ScraperError::MissingEnvelope`] if `scrapingResult.locals` is absent.
    ///
    /// Each of these is returned only after the retry budget is spent.
    pub async fn fetch_page(
        &self,
        request: &ScrapeRequest,
    ) -> Result<ScrapeResponse, ScraperError> {
        self.retry.run(|| self.send_once(request)).await
    }

    async fn send_once(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, ScraperError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let context = format!("{} page {}", request.keyword, request.page);
        let body = response.text().await?;
        let raw: Value = serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: context.clone(),
            source: e,
        })?;

        let records = extract_locals(&raw, &context)?;
        tracing::debug!(
            page = request.page,
            start = request.start,
            records = records.len(),
            "decoded locals page"
        );
        Ok(ScrapeResponse { records, raw })
    }

    /// Joins `base_url` with the locals path, tolerating a trailing slash.
    fn endpoint_url(base_url: &str) -> Result<Url, ScraperError> {
        let normalised = format!("{}/{LOCALS_PATH}", base_url.trim_end_matches('/'));
        Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Pulls `scrapingResult.locals` out of a decoded body.
fn extract_locals(raw: &Value, context: &str) -> Result<Vec<PlaceRecord>, ScraperError> {
    let locals = raw
        .pointer("/scrapingResult/locals")
        .filter(|v| v.is_array())
        .ok_or_else(|| ScraperError::MissingEnvelope {
            context: context.to_owned(),
        })?;

    Vec::<PlaceRecord>::deserialize(locals).map_err(|e| ScraperError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
