//! Fetch capability used by the listing coordinator and the detail view

use std::future::Future;
use std::time::Duration;

use directory_core::company::{CompanyDetails, CompanyId, CompanyRecord};
use directory_core::error::FetchError;
use directory_core::listing::{
    decode_page, parse_total_count, ListingQuery, Page, TOTAL_COUNT_HEADER,
};
use directory_core::local::{generate_companies, local_details, local_page};

use crate::config::{create_authenticated_client, DirectoryConfig};
use crate::prelude::*;

/// Where listing pages and company documents come from
pub trait CompanySource: Send + Sync + 'static {
    fn fetch_page(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Page, FetchError>> + Send;

    fn fetch_company(
        &self,
        id: &CompanyId,
    ) -> impl Future<Output = Result<CompanyDetails, FetchError>> + Send;
}

/// Which source the CLI talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// The admin HTTP API
    #[default]
    Remote,
    /// Generated sample companies, no network
    Local,
}

/// The admin backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        Ok(Self {
            client: create_authenticated_client(config)?,
            base_url: config.api_base().to_string(),
        })
    }

    fn listing_url(&self) -> String {
        format!("{}/admin/companies/", self.base_url)
    }

    fn company_url(&self, id: &CompanyId) -> String {
        format!(
            "{}/admin/companies/{}",
            self.base_url,
            urlencoding::encode(&id.0)
        )
    }
}

/// Map a reqwest failure onto the fetch error taxonomy
fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

impl CompanySource for HttpSource {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(self.listing_url())
            .query(&query.query_pairs())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let total = parse_total_count(
            response
                .headers()
                .get(TOTAL_COUNT_HEADER)
                .and_then(|value| value.to_str().ok()),
        );
        let body = response.text().await.map_err(transport_error)?;

        decode_page(&body, total)
    }

    async fn fetch_company(&self, id: &CompanyId) -> Result<CompanyDetails, FetchError> {
        let response = self
            .client
            .get(self.company_url(id))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Generated companies served from memory, with optional simulated latency
#[derive(Debug, Clone)]
pub struct LocalSource {
    records: Vec<CompanyRecord>,
    latency: Duration,
}

impl LocalSource {
    pub fn new(count: usize) -> Self {
        Self {
            records: generate_companies(count),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl CompanySource for LocalSource {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page, FetchError> {
        self.simulate_latency().await;
        Ok(local_page(&self.records, query))
    }

    async fn fetch_company(&self, id: &CompanyId) -> Result<CompanyDetails, FetchError> {
        self.simulate_latency().await;
        self.records
            .iter()
            .find(|record| &record.id == id)
            .map(local_details)
            .ok_or(FetchError::Http(404))
    }
}

/// Either source, chosen at startup
#[derive(Debug, Clone)]
pub enum AnySource {
    Remote(HttpSource),
    Local(LocalSource),
}

impl AnySource {
    pub fn from_options(
        kind: SourceKind,
        config: &DirectoryConfig,
        local_count: usize,
        local_latency: Duration,
    ) -> Result<Self> {
        Ok(match kind {
            SourceKind::Remote => AnySource::Remote(HttpSource::new(config)?),
            SourceKind::Local => {
                AnySource::Local(LocalSource::new(local_count).with_latency(local_latency))
            }
        })
    }
}

impl CompanySource for AnySource {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page, FetchError> {
        match self {
            AnySource::Remote(source) => source.fetch_page(query).await,
            AnySource::Local(source) => source.fetch_page(query).await,
        }
    }

    async fn fetch_company(&self, id: &CompanyId) -> Result<CompanyDetails, FetchError> {
        match self {
            AnySource::Remote(source) => source.fetch_company(id).await,
            AnySource::Local(source) => source.fetch_company(id).await,
        }
    }
}
