use crate::domain::models::{Interval, IntervalPage, NewInterval};
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;
use url::Url;

#[async_trait]
pub trait IntervalsApi: Send + Sync {
    /// `page` is zero-based, `sort` is `field,direction`.
    async fn list_intervals(
        &self,
        page: u32,
        size: u32,
        sort: &str,
    ) -> Result<IntervalPage, InfraError>;

    async fn create_interval(&self, interval: &NewInterval) -> Result<Interval, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestIntervalsClient {
    client: Client,
    base_url: Url,
}

impl ReqwestIntervalsClient {
    pub fn new(base_url: &str) -> Result<Self, InfraError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|error| InfraError::InvalidConfig(format!("invalid api base url '{base_url}': {error}")))?;
        if base_url.cannot_be_a_base() {
            return Err(InfraError::InvalidConfig(format!(
                "api base url cannot be a base: {base_url}"
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, InfraError> {
        Self::new(&config.base_url)
    }

    fn intervals_endpoint(&self) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                InfraError::InvalidConfig("api base url cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.push("intervals");
        }
        Ok(url)
    }

    fn api_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty());
        InfraError::Api {
            status: status.as_u16(),
            message,
        }
    }

    fn parse_page(body: &str) -> Result<IntervalPage, InfraError> {
        let page: IntervalPage = serde_json::from_str(body).map_err(|error| {
            InfraError::Http(format!("invalid interval list payload: {error}; body={body}"))
        })?;
        for interval in &page.intervals {
            Self::check_received(interval)?;
        }
        Ok(page)
    }

    fn parse_interval(body: &str) -> Result<Interval, InfraError> {
        let interval: Interval = serde_json::from_str(body).map_err(|error| {
            InfraError::Http(format!("invalid interval create payload: {error}; body={body}"))
        })?;
        Self::check_received(&interval)?;
        Ok(interval)
    }

    fn check_received(interval: &Interval) -> Result<(), InfraError> {
        interval.validate().map_err(|message| {
            InfraError::Http(format!("server returned invalid interval '{}': {message}", interval.id))
        })
    }
}

#[async_trait]
impl IntervalsApi for ReqwestIntervalsClient {
    async fn list_intervals(
        &self,
        page: u32,
        size: u32,
        sort: &str,
    ) -> Result<IntervalPage, InfraError> {
        let endpoint = self.intervals_endpoint()?;
        let response = self
            .client
            .get(endpoint)
            .query(&[("page", page.to_string()), ("size", size.to_string())])
            .query(&[("sort", sort)])
            .send()
            .await
            .map_err(|error| InfraError::Http(format!("network error while listing intervals: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Http(format!("failed reading interval list response: {error}")))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "listing intervals failed");
            return Err(Self::api_error(status, &body));
        }

        Self::parse_page(&body)
    }

    async fn create_interval(&self, interval: &NewInterval) -> Result<Interval, InfraError> {
        let endpoint = self.intervals_endpoint()?;
        let response = self
            .client
            .post(endpoint)
            .json(interval)
            .send()
            .await
            .map_err(|error| InfraError::Http(format!("network error while creating interval: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Http(format!("failed reading interval create response: {error}")))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "creating interval failed");
            return Err(Self::api_error(status, &body));
        }

        Self::parse_interval(&body)
    }
}
