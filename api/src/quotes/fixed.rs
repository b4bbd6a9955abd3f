use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::{normalize_symbol, Quote, QuoteError, QuoteProvider};

/// An in-memory price table, for offline runs and tests.
#[derive(Default)]
pub struct FixedQuotes {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl FixedQuotes {
    pub fn new(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let table = quotes
            .into_iter()
            .map(|quote| (normalize_symbol(&quote.symbol), quote))
            .collect();
        FixedQuotes {
            quotes: RwLock::new(table),
        }
    }

    /// Parses `SYM=price[,SYM=price...]`; the name of each quote is its symbol.
    pub fn parse(table: &str) -> Result<Vec<Quote>, QuoteError> {
        table.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (symbol, price) = entry
                    .split_once('=')
                    .ok_or_else(|| QuoteError::Malformed(format!("expected SYM=price, got {:?}", entry)))?;
                let symbol = normalize_symbol(symbol);
                let price = BigDecimal::from_str(price.trim())
                    .map_err(|e| QuoteError::Malformed(format!("{}: {}", entry, e)))?;
                if symbol.is_empty() || price <= BigDecimal::from(0) {
                    return Err(QuoteError::Malformed(format!("invalid quote {:?}", entry)));
                }
                Ok(Quote {
                    name: symbol.clone(),
                    symbol,
                    price,
                })
            })
            .collect()
    }

    pub fn set_price(&self, symbol: &str, price: BigDecimal) {
        let symbol = normalize_symbol(symbol);
        let mut quotes = match self.quotes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        quotes
            .entry(symbol.clone())
            .and_modify(|quote| quote.price = price.clone())
            .or_insert(Quote {
                name: symbol.clone(),
                symbol,
                price,
            });
    }

    /// Drops `symbol` from the table; later lookups report it as unknown.
    pub fn delist(&self, symbol: &str) {
        let mut quotes = match self.quotes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        quotes.remove(&normalize_symbol(symbol));
    }
}

#[async_trait]
impl QuoteProvider for FixedQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        let quotes = match self.quotes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(quotes.get(&normalize_symbol(symbol)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_price_table() {
        let quotes = FixedQuotes::parse(" aapl=189.50, MSFT = 410 ,").unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].symbol, "AAPL");
        assert_eq!(quotes[0].name, "AAPL");
        assert_eq!(quotes[0].price, BigDecimal::from_str("189.5").unwrap());
        assert_eq!(quotes[1].symbol, "MSFT");
    }

    #[test]
    fn rejects_bad_entries() {
        for table in ["AAPL", "AAPL=abc", "=10", "AAPL=0", "AAPL=-1"] {
            assert!(FixedQuotes::parse(table).is_err(), "{table} should be rejected");
        }
    }

    #[actix_web::test]
    async fn lookup_is_case_insensitive_and_prices_can_move() {
        let provider = FixedQuotes::new(FixedQuotes::parse("AAPL=50").unwrap());

        let quote = provider.lookup(" aapl ").await.unwrap().unwrap();
        assert_eq!(quote.price, BigDecimal::from(50));
        assert!(provider.lookup("ZZZZ").await.unwrap().is_none());

        provider.set_price("AAPL", BigDecimal::from(75));
        provider.set_price("NEW", BigDecimal::from(1));
        assert_eq!(
            provider.lookup("AAPL").await.unwrap().unwrap().price,
            BigDecimal::from(75)
        );
        assert!(provider.lookup("new").await.unwrap().is_some());

        provider.delist("new");
        assert!(provider.lookup("NEW").await.unwrap().is_none());
    }
}
