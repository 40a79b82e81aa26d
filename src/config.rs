use crate::error::{Error, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub event_poll_interval_ms: u64,
    pub log_format: Option<String>,
    pub scoring: ScoringConfig,
}

/// Thresholds driving certification scoring. Rates and percentages are
/// expressed out of 100.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub minimum_reproducibility_rate_to_be_certified: Decimal,
    pub minimum_reproducibility_rate_to_be_trusted: Decimal,
    pub partner_min_percentage: Decimal,
    pub pix_count_by_level: i32,
    pub max_reachable_level: i32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse("DATABASE_MAX_CONNECTIONS")?,
            event_poll_interval_ms: get_env_parse("EVENT_POLL_INTERVAL_MS")?,
            log_format: env::var("LOG_FORMAT").ok(),
            scoring: ScoringConfig::from_env()?,
        })
    }
}

impl ScoringConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            minimum_reproducibility_rate_to_be_certified: get_env_parse(
                "MINIMUM_REPRODUCIBILITY_RATE_TO_BE_CERTIFIED",
            )?,
            minimum_reproducibility_rate_to_be_trusted: get_env_parse(
                "MINIMUM_REPRODUCIBILITY_RATE_TO_BE_TRUSTED",
            )?,
            partner_min_percentage: get_env_parse("PARTNER_MIN_PERCENTAGE")?,
            pix_count_by_level: get_env_parse("PIX_COUNT_BY_LEVEL")?,
            max_reachable_level: get_env_parse("MAX_REACHABLE_LEVEL")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.minimum_reproducibility_rate_to_be_certified
            > self.minimum_reproducibility_rate_to_be_trusted
        {
            return Err(Error::Config(
                "MINIMUM_REPRODUCIBILITY_RATE_TO_BE_CERTIFIED must not exceed MINIMUM_REPRODUCIBILITY_RATE_TO_BE_TRUSTED".to_string(),
            ));
        }
        if self.pix_count_by_level <= 0 || self.max_reachable_level <= 0 {
            return Err(Error::Config(
                "PIX_COUNT_BY_LEVEL and MAX_REACHABLE_LEVEL must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
