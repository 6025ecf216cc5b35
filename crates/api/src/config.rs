//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use tally_admission::{LimiterConfig, LimiterConfigError};
use tally_observability::{LogFormat, UnknownLogFormat};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_API_KEY: &str = "dev-api-key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("{var}: must not be empty")]
    Empty { var: &'static str },

    #[error(transparent)]
    Limiter(#[from] LimiterConfigError),

    #[error(transparent)]
    LogFormat(#[from] UnknownLogFormat),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Shared credential expected in `X-API-Key`.
    pub api_key: String,
    /// True when no key was configured and the dev default is in use.
    pub api_key_defaulted: bool,
    pub limiter: LimiterConfig,
    /// How often idle admission buckets are swept.
    pub sweep_interval: Duration,
    pub log_format: LogFormat,
}

impl ApiConfig {
    /// Config with defaults and the given API key (tests, embedding).
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            api_key: api_key.into(),
            api_key_defaulted: false,
            limiter: LimiterConfig::default(),
            sweep_interval: Duration::from_secs(60),
            log_format: LogFormat::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_or(&lookup, "TALLY_BIND_ADDR", || {
            SocketAddr::from(([0, 0, 0, 0], 8080))
        })?;

        let (api_key, api_key_defaulted) = match lookup("TALLY_API_KEY") {
            Some(key) if key.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: "TALLY_API_KEY",
                });
            }
            Some(key) => (key, false),
            None => (DEV_API_KEY.to_string(), true),
        };

        let capacity: f64 = parse_or(&lookup, "TALLY_RATE_CAPACITY", || 10.0)?;
        let refill: f64 = parse_or(&lookup, "TALLY_RATE_REFILL_PER_SEC", || 1.0)?;
        let idle_ttl = parse_opt::<u64>(&lookup, "TALLY_RATE_IDLE_TTL_SECS")?.map(Duration::from_secs);
        let limiter = LimiterConfig::new(capacity, refill, idle_ttl)?;

        let sweep_secs: u64 = parse_or(&lookup, "TALLY_RATE_SWEEP_SECS", || 60)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "TALLY_RATE_SWEEP_SECS",
                value: "0".to_string(),
            });
        }

        let log_format = match lookup("TALLY_LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            api_key,
            api_key_defaulted,
            limiter,
            sweep_interval: Duration::from_secs(sweep_secs),
            log_format,
        })
    }
}

fn parse_opt<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(None),
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(lookup, var)?.unwrap_or_else(default))
}
