use crate::error::{ConfigError, QueryError};
use crate::models::{Category, Country, Furnishing, Query, RentalPeriod, SortBy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.scraperapi.com/";

/// Limits and endpoints for one pagination run, built once at startup
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub concurrency: usize,
    pub page_cap: u32,
    /// Listings on a full results page
    pub page_size: usize,
    /// Overrides `https://www.propertyfinder.{country}/en/search`
    pub base_url: Option<String>,
    pub relay: Option<RelayConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
            timeout: Duration::from_secs(10),
            concurrency: 3,
            page_cap: 100,
            page_size: 20,
            base_url: None,
            relay: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_at_least("max_attempts", self.max_attempts as usize, 1)?;
        validate_at_least("concurrency", self.concurrency, 1)?;
        validate_at_least("page_cap", self.page_cap as usize, 1)?;
        validate_at_least("page_size", self.page_size, 1)?;
        if self.timeout < Duration::from_secs(1) {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                value: format!("{:?}", self.timeout),
                reason: "must be at least 1s".to_string(),
            });
        }

        if let Some(base) = &self.base_url {
            validate_http_url("base_url", base)?;
        }
        if let Some(relay) = &self.relay {
            validate_http_url("relay_endpoint", &relay.endpoint)?;
            if relay.api_key.trim().is_empty() {
                return Err(ConfigError::Missing {
                    field: "scraper_api_key",
                });
            }
        }
        Ok(())
    }
}

/// Relay endpoint that forwards the target URL
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub api_key: String,
}

fn validate_at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::InvalidValue {
            field,
            value: value.to_string(),
            reason: format!("must be at least {}", min),
        });
    }
    Ok(())
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ConfigError::InvalidValue {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "listing-scout")]
#[command(about = "Harvest property listings from paginated search results")]
pub struct Cli {
    /// Country code (ae, qa, bh, eg, sa)
    #[arg(long, default_value = "ae")]
    pub country: Country,

    /// Location id; defaults to the country's first location
    #[arg(long)]
    pub location: Option<u32>,

    /// Category id (1 buy .. 5 new-projects)
    #[arg(long, default_value = "1")]
    pub category: Category,

    /// Furnishing id (0 all, 1 furnished, 2 unfurnished, 3 partly)
    #[arg(long, default_value = "0")]
    pub furnishing: Furnishing,

    /// Rental period code (y, m, w, d)
    #[arg(long, default_value = "y")]
    pub rental_period: RentalPeriod,

    /// Sort code (mr, nd, pa, pd, ba, bd)
    #[arg(long, default_value = "mr")]
    pub sort_by: SortBy,

    #[arg(long, env = "SCOUT_MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    #[arg(long, env = "SCOUT_RETRY_DELAY_MS", default_value = "0")]
    pub retry_delay_ms: u64,

    #[arg(long, env = "SCOUT_TIMEOUT_SECS", default_value = "10")]
    pub timeout_secs: u64,

    /// Pages fetched at the same time
    #[arg(long, env = "SCOUT_CONCURRENCY", default_value = "3")]
    pub concurrency: usize,

    #[arg(long, env = "SCOUT_PAGE_CAP", default_value = "100")]
    pub page_cap: u32,

    /// Listings on a full results page
    #[arg(long, env = "SCOUT_PAGE_SIZE", default_value = "20")]
    pub page_size: usize,

    #[arg(long, env = "SCOUT_BASE_URL")]
    pub base_url: Option<String>,

    /// Route requests through the relay endpoint
    #[arg(long, env = "USE_SCRAPER_API")]
    pub use_relay: bool,

    #[arg(long, env = "SCRAPER_API_ENDPOINT", default_value = DEFAULT_RELAY_ENDPOINT)]
    pub relay_endpoint: String,

    #[arg(long, env = "SCRAPER_API_KEY", hide_env_values = true)]
    pub scraper_api_key: Option<String>,

    /// File with one User-Agent per line
    #[arg(long, env = "SCOUT_USER_AGENTS")]
    pub user_agents: Option<PathBuf>,

    #[arg(long, default_value = "./output")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Print the accepted option codes and exit
    #[arg(long)]
    pub list_options: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    pub fn query(&self) -> Result<Query, QueryError> {
        let location = self
            .location
            .unwrap_or_else(|| self.country.default_location().id);

        Query::new(
            self.country,
            location,
            self.category,
            self.furnishing,
            self.rental_period,
            self.sort_by,
        )
    }

    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let relay = if self.use_relay {
            let api_key = self
                .scraper_api_key
                .clone()
                .ok_or(ConfigError::Missing {
                    field: "scraper_api_key",
                })?;
            Some(RelayConfig {
                endpoint: self.relay_endpoint.clone(),
                api_key,
            })
        } else {
            None
        };

        let config = SessionConfig {
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            concurrency: self.concurrency,
            page_cap: self.page_cap,
            page_size: self.page_size,
            base_url: self.base_url.clone(),
            relay,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["listing-scout"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_session_defaults() {
        let cli = parse(&[]);
        let config = cli.session_config().unwrap();
        let defaults = SessionConfig::default();

        assert_eq!(config.max_attempts, defaults.max_attempts);
        assert_eq!(config.concurrency, defaults.concurrency);
        assert_eq!(config.page_cap, defaults.page_cap);
        assert_eq!(config.page_size, defaults.page_size);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert!(config.relay.is_none());
    }

    #[test]
    fn test_query_defaults_to_first_location() {
        let cli = parse(&["--country", "qa"]);
        let query = cli.query().unwrap();
        assert_eq!(query.country(), Country::Qa);
        assert_eq!(query.location(), 9);
        assert_eq!(query.sort_by(), SortBy::Featured);
    }

    #[test]
    fn test_invalid_codes_fail_to_parse() {
        let argv = ["listing-scout", "--rental-period", "q"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let cli = parse(&["--concurrency", "0"]);
        assert!(matches!(
            cli.session_config(),
            Err(ConfigError::InvalidValue {
                field: "concurrency",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let cli = parse(&["--timeout-secs", "0"]);
        assert!(matches!(
            cli.session_config(),
            Err(ConfigError::InvalidValue {
                field: "timeout",
                ..
            })
        ));

        let config = SessionConfig {
            timeout: Duration::from_millis(500),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(parse(&["--timeout-secs", "1"]).session_config().is_ok());
    }

    #[test]
    fn test_relay_requires_api_key() {
        let mut cli = parse(&[]);
        cli.use_relay = true;
        cli.scraper_api_key = None;
        assert!(matches!(
            cli.session_config(),
            Err(ConfigError::Missing { .. })
        ));

        cli.scraper_api_key = Some("secret".to_string());
        let relay = cli.session_config().unwrap().relay.unwrap();
        assert_eq!(relay.endpoint, DEFAULT_RELAY_ENDPOINT);
        assert_eq!(relay.api_key, "secret");
    }

    #[test]
    fn test_base_url_must_be_http() {
        let config = SessionConfig {
            base_url: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
