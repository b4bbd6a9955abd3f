use async_trait::async_trait;
use bigdecimal::BigDecimal;
use log::warn;
use thiserror::Error;

pub mod alpha_vantage;
pub mod fixed;

pub use alpha_vantage::AlphaVantageQuotes;
pub use fixed::FixedQuotes;

/// A live price for one ticker. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quote provider rate limit reached")]
    RateLimited,

    #[error("unexpected quote response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// `Ok(None)` means the provider does not know the symbol.
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError>;
}

/// Trims and upper-cases a ticker typed by a user.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Looks up a quote, treating provider failures like an unknown symbol.
pub async fn resolve(provider: &dyn QuoteProvider, symbol: &str) -> Option<Quote> {
    match provider.lookup(symbol).await {
        Ok(quote) => quote,
        Err(e) => {
            warn!("Quote lookup for {} failed: {}", symbol, e);
            None
        }
    }
}
