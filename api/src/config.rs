use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::quotes::alpha_vantage::DEFAULT_BASE_URL;
use crate::quotes::{FixedQuotes, Quote};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub enum QuoteSource {
    AlphaVantage { api_key: String, base_url: String },
    Fixed(Vec<Quote>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    pub starting_cash: BigDecimal,
    pub quotes: QuoteSource,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let quotes = match (var("ALPHA_VANTAGE_API_KEY"), var("FIXED_QUOTES")) {
            (Some(api_key), _) => QuoteSource::AlphaVantage {
                api_key,
                base_url: var("ALPHA_VANTAGE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            },
            (None, Some(table)) => {
                let quotes = FixedQuotes::parse(&table).map_err(|e| ConfigError::Invalid {
                    key: "FIXED_QUOTES",
                    message: e.to_string(),
                })?;
                QuoteSource::Fixed(quotes)
            }
            (None, None) => return Err(ConfigError::Missing("ALPHA_VANTAGE_API_KEY")),
        };

        let starting_cash = parse_or("STARTING_CASH", var("STARTING_CASH"), || {
            BigDecimal::from(10000)
        })?;
        if starting_cash < BigDecimal::from(0) {
            return Err(ConfigError::Invalid {
                key: "STARTING_CASH",
                message: "must not be negative".to_string(),
            });
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", var("BCRYPT_COST"), || bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                message: "must be between 4 and 31".to_string(),
            });
        }

        Ok(Config {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "finance.db".to_string()),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", var("PORT"), || 8080)?,
            jwt_secret,
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", var("TOKEN_TTL_HOURS"), || 24)?,
            cookie_secure: parse_or("COOKIE_SECURE", var("COOKIE_SECURE"), || false)?,
            bcrypt_cost,
            starting_cash,
            quotes,
        })
    }
}

fn parse_or<T, D>(key: &'static str, value: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> T,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => Ok(default()),
    }
}
