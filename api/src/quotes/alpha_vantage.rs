use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{Quote, QuoteError, QuoteProvider};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Deserialize)]
struct SymbolSearchResponse {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SymbolMatch>,
}

#[derive(Deserialize)]
struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
}

/// Parses a `GLOBAL_QUOTE` body into `(symbol, price)`. An empty quote object
/// is how the service reports an unknown ticker.
pub(crate) fn parse_global_quote(body: &str) -> Result<Option<(String, BigDecimal)>, QuoteError> {
    let response: GlobalQuoteResponse =
        serde_json::from_str(body).map_err(|e| QuoteError::Malformed(e.to_string()))?;

    if response.error_message.is_some() {
        return Ok(None);
    }
    if response.note.is_some() || response.information.is_some() {
        return Err(QuoteError::RateLimited);
    }

    let Some(quote) = response.global_quote else {
        return Ok(None);
    };
    match (quote.symbol, quote.price) {
        (Some(symbol), Some(price)) => {
            let price = BigDecimal::from_str(price.trim())
                .map_err(|e| QuoteError::Malformed(format!("price {:?}: {}", price, e)))?;
            if price <= BigDecimal::from(0) {
                return Ok(None);
            }
            Ok(Some((symbol, price)))
        }
        _ => Ok(None),
    }
}

/// Picks the company name for `symbol` out of a `SYMBOL_SEARCH` body.
pub(crate) fn parse_company_name(body: &str, symbol: &str) -> Option<String> {
    let response: SymbolSearchResponse = serde_json::from_str(body).ok()?;
    response
        .best_matches
        .into_iter()
        .find(|m| m.symbol.eq_ignore_ascii_case(symbol))
        .map(|m| m.name)
}

pub struct AlphaVantageQuotes {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageQuotes {
    pub fn new(api_key: String, base_url: String) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(AlphaVantageQuotes {
            client,
            base_url,
            api_key,
        })
    }

    async fn fetch(&self, function: &str, params: &[(&str, &str)]) -> Result<String, QuoteError> {
        let mut query = vec![("function", function), ("apikey", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited);
        }
        if !status.is_success() {
            return Err(QuoteError::Malformed(format!("HTTP {}", status)));
        }
        Ok(response.text().await?)
    }

    async fn company_name(&self, symbol: &str) -> Option<String> {
        match self.fetch("SYMBOL_SEARCH", &[("keywords", symbol)]).await {
            Ok(body) => parse_company_name(&body, symbol),
            Err(e) => {
                debug!("Name lookup for {} failed: {}", symbol, e);
                None
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        if symbol.is_empty() {
            return Ok(None);
        }

        let body = self.fetch("GLOBAL_QUOTE", &[("symbol", symbol)]).await?;
        let Some((symbol, price)) = parse_global_quote(&body)? else {
            return Ok(None);
        };

        let name = self
            .company_name(&symbol)
            .await
            .unwrap_or_else(|| symbol.clone());
        Ok(Some(Quote {
            symbol,
            name,
            price,
        }))
    }
}
