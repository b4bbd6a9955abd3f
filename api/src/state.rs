use std::sync::Arc;

use bigdecimal::BigDecimal;
use db::{establish_connection_pool, run_migrations, DbPool, LedgerError};
use log::info;
use thiserror::Error;

use crate::config::{Config, QuoteSource};
use crate::quotes::{AlphaVantageQuotes, FixedQuotes, QuoteError, QuoteProvider};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("database: {0}")]
    Ledger(#[from] LedgerError),

    #[error("quote provider: {0}")]
    Quotes(#[from] QuoteError),
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl From<&Config> for AuthSettings {
    fn from(config: &Config) -> Self {
        AuthSettings {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_hours: config.token_ttl_hours,
            cookie_secure: config.cookie_secure,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

/// Everything a request handler needs, shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub quotes: Arc<dyn QuoteProvider>,
    pub auth: AuthSettings,
    pub starting_cash: BigDecimal,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        quotes: Arc<dyn QuoteProvider>,
        auth: AuthSettings,
        starting_cash: BigDecimal,
    ) -> Self {
        AppState {
            pool,
            quotes,
            auth,
            starting_cash,
        }
    }
}

/// Opens and migrates the database and picks the quote provider.
pub fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let pool = establish_connection_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let quotes: Arc<dyn QuoteProvider> = match &config.quotes {
        QuoteSource::AlphaVantage { api_key, base_url } => {
            info!("Using Alpha Vantage quotes from {}", base_url);
            Arc::new(AlphaVantageQuotes::new(api_key.clone(), base_url.clone())?)
        }
        QuoteSource::Fixed(quotes) => {
            info!("Using fixed quotes for {} symbols", quotes.len());
            Arc::new(FixedQuotes::new(quotes.clone()))
        }
    };

    Ok(AppState::new(
        pool,
        quotes,
        AuthSettings::from(config),
        config.starting_cash.clone(),
    ))
}
