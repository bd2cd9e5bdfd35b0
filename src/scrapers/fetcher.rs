use crate::config::SessionConfig;
use crate::error::{ConfigError, FetchError, TransportError};
use crate::models::{Country, PageResult, Query};
use crate::scrapers::extract::PayloadExtractor;
use crate::scrapers::request_mask::RequestDecorator;
use crate::scrapers::retry::RetryPolicy;
use crate::scrapers::traits::{PageSource, Transport};
use crate::scrapers::types::AttemptContext;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Search page for a country site
pub fn default_search_url(country: Country) -> String {
    format!("https://www.propertyfinder.{}/en/search", country.code())
}

/// `{base}?l=..&c=..&fu=..&rp=..&ob=..&page=..`, always in that order
pub fn page_url(base: &str, query: &Query, page: u32) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in query.search_params() {
            pairs.append_pair(key, &value);
        }
        pairs.append_pair("page", &page.to_string());
    }
    Ok(url)
}

/// reqwest-backed transport; non-2xx statuses are errors
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<String, TransportError> {
        let response = self.client.get(url).headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Fetches one results page with retries and pulls out its payload
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    decorator: RequestDecorator,
    extractor: PayloadExtractor,
    retry: RetryPolicy,
    base_url: Option<String>,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, decorator: RequestDecorator) -> Self {
        Self {
            transport,
            decorator,
            extractor: PayloadExtractor::new(),
            retry: RetryPolicy::default(),
            base_url: None,
        }
    }

    /// HTTP fetcher with the retry, timeout and endpoint settings of `config`
    pub fn from_config(
        config: &SessionConfig,
        decorator: RequestDecorator,
    ) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::new(Arc::new(transport), decorator)
            .with_retry(RetryPolicy::new(config.max_attempts, config.retry_delay))
            .with_base_url(config.base_url.clone()))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_extractor(mut self, extractor: PayloadExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn url_for(&self, query: &Query, page: u32) -> Result<Url, url::ParseError> {
        match &self.base_url {
            Some(base) => page_url(base, query, page),
            None => page_url(&default_search_url(query.country()), query, page),
        }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, query: &Query, page: u32) -> PageResult {
        let url = match self.url_for(query, page) {
            Ok(url) => url.to_string(),
            Err(e) => {
                error!("Could not build URL for page {}: {}", page, e);
                return PageResult::Failed(FetchError::InvalidUrl(e.to_string()));
            }
        };

        let label = format!("page {}", page);
        let body = self
            .retry
            .run(&label, |attempt| {
                let request = self.decorator.decorate(&url, AttemptContext::new(page, attempt));
                info!("Requesting page {} (attempt {})", page, attempt);
                let transport = Arc::clone(&self.transport);
                async move { transport.get(&request.url, request.headers).await }
            })
            .await;

        match body {
            Ok(body) => match self.extractor.extract(&body) {
                Some(payload) => PageResult::Success(payload),
                None => {
                    warn!("No listing payload found on page {}", page);
                    PageResult::Empty
                }
            },
            Err(exhausted) => {
                error!(
                    "Failed to fetch page {} after {} attempts",
                    page, exhausted.attempts
                );
                PageResult::Failed(FetchError::RetriesExhausted {
                    attempts: exhausted.attempts,
                    last: exhausted.last,
                })
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "Property Finder"
    }
}
