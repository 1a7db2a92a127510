use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use error_stack::{ResultExt, report};
use swapper_models::network::RateLimitWindow;

use crate::error::{EngineResult, Error};
use crate::swappers::SwapperName;

pub const DEFAULT_THORNODE_URL: &str = "https://thornode.ninerealms.com";
pub const DEFAULT_ZERO_X_URL: &str = "https://api.0x.org";
pub const DEFAULT_ONE_INCH_URL: &str = "https://api.1inch.dev/swap/v6.0";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub thornode_url: String,
    pub zero_x_url: String,
    pub zero_x_api_key: Option<String>,
    pub one_inch_url: String,
    pub one_inch_api_key: Option<String>,
    /// Deadline of a single source quote
    pub quote_timeout: Duration,
    pub fee_estimate_timeout: Duration,
    pub affiliate_fees_enabled: bool,
    pub affiliate_bps: u32,
    pub affiliate_excluded_swappers: HashSet<SwapperName>,
    /// Wait between the UTXO funding tx and the retried withdraw
    pub utxo_retry_delay: Duration,
    pub source_rate_limit: Option<RateLimitWindow>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            thornode_url: DEFAULT_THORNODE_URL.to_string(),
            zero_x_url: DEFAULT_ZERO_X_URL.to_string(),
            zero_x_api_key: None,
            one_inch_url: DEFAULT_ONE_INCH_URL.to_string(),
            one_inch_api_key: None,
            quote_timeout: Duration::from_millis(10_000),
            fee_estimate_timeout: Duration::from_millis(5_000),
            affiliate_fees_enabled: false,
            affiliate_bps: 0,
            affiliate_excluded_swappers: HashSet::new(),
            utxo_retry_delay: Duration::from_millis(5_000),
            source_rate_limit: None,
        }
    }
}

impl EngineConfig {
    /// Reads the process environment, after loading `.env` if there is one
    pub fn from_env() -> EngineResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let affiliate_excluded_swappers = match read("AFFILIATE_EXCLUDED_SWAPPERS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    SwapperName::from_str(name)
                        .change_context(Error::ConfigError(format!("Unknown swapper {name}")))
                })
                .collect::<EngineResult<HashSet<SwapperName>>>()?,
            None => defaults.affiliate_excluded_swappers,
        };

        let source_rate_limit = match read("SOURCE_RATE_LIMIT") {
            Some(raw) => Some(RateLimitWindow::from_string(&raw).ok_or_else(|| {
                report!(Error::ConfigError(format!("SOURCE_RATE_LIMIT={raw}")))
            })?),
            None => None,
        };

        let config = EngineConfig {
            thornode_url: read("THORNODE_URL").unwrap_or(defaults.thornode_url),
            zero_x_url: read("ZERO_X_URL").unwrap_or(defaults.zero_x_url),
            zero_x_api_key: read("ZERO_X_API_KEY"),
            one_inch_url: read("ONE_INCH_URL").unwrap_or(defaults.one_inch_url),
            one_inch_api_key: read("ONE_INCH_API_KEY"),
            quote_timeout: parse_millis(read("QUOTE_TIMEOUT_MS"), "QUOTE_TIMEOUT_MS")?
                .unwrap_or(defaults.quote_timeout),
            fee_estimate_timeout: parse_millis(
                read("FEE_ESTIMATE_TIMEOUT_MS"),
                "FEE_ESTIMATE_TIMEOUT_MS",
            )?
            .unwrap_or(defaults.fee_estimate_timeout),
            affiliate_fees_enabled: parse_value(
                read("AFFILIATE_FEES_ENABLED"),
                "AFFILIATE_FEES_ENABLED",
            )?
            .unwrap_or(defaults.affiliate_fees_enabled),
            affiliate_bps: parse_value(read("AFFILIATE_BPS"), "AFFILIATE_BPS")?
                .unwrap_or(defaults.affiliate_bps),
            affiliate_excluded_swappers,
            utxo_retry_delay: parse_millis(read("UTXO_RETRY_DELAY_MS"), "UTXO_RETRY_DELAY_MS")?
                .unwrap_or(defaults.utxo_retry_delay),
            source_rate_limit,
        };

        if config.affiliate_bps > 10_000 {
            return Err(report!(Error::ConfigError(format!(
                "AFFILIATE_BPS={} exceeds 10000",
                config.affiliate_bps
            ))));
        }

        Ok(config)
    }

    /// Affiliate fees apply to this source
    pub fn affiliate_bps_for(&self, swapper: SwapperName) -> Option<u32> {
        (self.affiliate_fees_enabled
            && self.affiliate_bps > 0
            && !self.affiliate_excluded_swappers.contains(&swapper))
        .then_some(self.affiliate_bps)
    }
}

fn parse_value<T: FromStr>(raw: Option<String>, key: &str) -> EngineResult<Option<T>> {
    raw.map(|raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|_| report!(Error::ConfigError(format!("{key}={raw}"))))
    })
    .transpose()
}

fn parse_millis(raw: Option<String>, key: &str) -> EngineResult<Option<Duration>> {
    Ok(parse_value::<u64>(raw, key)?.map(Duration::from_millis))
}
