//! Browser-like request headers and optional relay rewriting.

use crate::config::RelayConfig;
use crate::scrapers::types::{AttemptContext, DecoratedRequest};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};
use url::Url;

/// Sent when the pool is empty or an entry is not a valid header value
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Builds the URL and headers for each request attempt.
///
/// Read-only after construction, so one instance is shared by every
/// in-flight page.
#[derive(Debug, Clone)]
pub struct RequestDecorator {
    user_agents: Vec<String>,
    seed: usize,
    extra_headers: HeaderMap,
    relay: Option<RelayConfig>,
}

impl RequestDecorator {
    pub fn new(relay: Option<RelayConfig>) -> Self {
        Self::with_user_agents(
            BROWSER_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            relay,
        )
    }

    pub fn with_user_agents(user_agents: Vec<String>, relay: Option<RelayConfig>) -> Self {
        let seed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as usize)
            .unwrap_or(0);

        Self {
            user_agents,
            seed,
            extra_headers: HeaderMap::new(),
            relay,
        }
    }

    /// Load the pool from a file with one User-Agent per line.
    /// Falls back to the builtin pool if the file is unreadable or empty.
    pub fn from_file(path: &Path, relay: Option<RelayConfig>) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let pool = parse_user_agents(&contents);
                if pool.is_empty() {
                    warn!("No user agents in {}, using builtin pool", path.display());
                    Self::new(relay)
                } else {
                    debug!("Loaded {} user agents from {}", pool.len(), path.display());
                    Self::with_user_agents(pool, relay)
                }
            }
            Err(e) => {
                warn!(
                    "Failed to read user agents from {}: {}, using builtin pool",
                    path.display(),
                    e
                );
                Self::new(relay)
            }
        }
    }

    /// Fix the rotation offset
    pub fn with_seed(mut self, seed: usize) -> Self {
        self.seed = seed;
        self
    }

    /// Headers merged over the defaults on every request
    pub fn with_extra_headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers = headers;
        self
    }

    pub fn user_agent(&self, ctx: AttemptContext) -> &str {
        if self.user_agents.is_empty() {
            return FALLBACK_USER_AGENT;
        }
        let offset = (ctx.page as usize)
            .wrapping_mul(31)
            .wrapping_add(ctx.attempt as usize);
        let index = self.seed.wrapping_add(offset) % self.user_agents.len();
        &self.user_agents[index]
    }

    pub fn headers(&self, ctx: AttemptContext) -> HeaderMap {
        let user_agent = HeaderValue::from_str(self.user_agent(ctx))
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_USER_AGENT));

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        for (name, value) in &self.extra_headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// Target URL, wrapped by the relay endpoint when relay mode is on
    pub fn target_url(&self, url: &str) -> String {
        let Some(relay) = &self.relay else {
            return url.to_string();
        };

        match Url::parse_with_params(
            &relay.endpoint,
            &[("api_key", relay.api_key.as_str()), ("url", url)],
        ) {
            Ok(wrapped) => wrapped.into(),
            Err(e) => {
                warn!("Invalid relay endpoint {}: {}, requesting directly", relay.endpoint, e);
                url.to_string()
            }
        }
    }

    pub fn decorate(&self, url: &str, ctx: AttemptContext) -> DecoratedRequest {
        DecoratedRequest {
            url: self.target_url(url),
            headers: self.headers(ctx),
        }
    }
}

impl Default for RequestDecorator {
    fn default() -> Self {
        Self::new(None)
    }
}

fn parse_user_agents(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
