use crate::error::TransportError;
use crate::models::{PageResult, Query};
use async_trait::async_trait;
use reqwest::header::HeaderMap;

/// One GET round trip; stub it to test retry behaviour without a network
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and return the body of a 2xx response
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<String, TransportError>;
}

/// Source of results pages driven by the pagination controller
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, query: &Query, page: u32) -> PageResult;

    /// Name used in log lines
    fn source_name(&self) -> &'static str;
}
