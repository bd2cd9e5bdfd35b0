use reqwest::header::HeaderMap;

/// Which request a set of headers is being built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptContext {
    pub page: u32,
    /// 1-based
    pub attempt: u32,
}

impl AttemptContext {
    pub fn new(page: u32, attempt: u32) -> Self {
        Self { page, attempt }
    }
}

/// Final URL and headers for one attempt
#[derive(Debug, Clone)]
pub struct DecoratedRequest {
    pub url: String,
    pub headers: HeaderMap,
}
