//! Price Lookup
//!
//! `PriceLookup` is the only path from the agent to market data. It owns the
//! validation and rounding rules; providers only report what they saw.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::AssistantError;
use crate::models::{round_price, PriceQuote, DEFAULT_CURRENCY};
use crate::Result;

pub mod yahoo;
pub use yahoo::YahooFinanceProvider;

/// Source of latest traded prices.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// `Ok(None)` when the provider answered but has no usable price.
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>>;
}

/// Validating wrapper around a market data provider
#[derive(Clone)]
pub struct PriceLookup {
    provider: Arc<dyn MarketDataProvider>,
}

impl PriceLookup {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Fetch the current price for `symbol`, rounded to cents.
    ///
    /// Currency is always reported as USD.
    pub async fn lookup(&self, symbol: &str) -> Result<PriceQuote> {
        let result = self.fetch(symbol).await;

        if let Err(e) = &result {
            error!("Error fetching stock price for {}: {}", symbol, e);
        }

        result
    }

    async fn fetch(&self, symbol: &str) -> Result<PriceQuote> {
        if symbol.trim().is_empty() {
            return Err(AssistantError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }

        if !is_ticker(symbol) {
            return Err(AssistantError::InvalidSymbol(format!(
                "not a ticker symbol: {:?}",
                symbol
            )));
        }

        info!("Fetching price for symbol: {}", symbol);

        let price = self
            .provider
            .latest_price(symbol)
            .await?
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(round_price)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| {
                AssistantError::PriceUnavailable(format!(
                    "No price data found for symbol: {}",
                    symbol
                ))
            })?;

        Ok(PriceQuote {
            price,
            currency: DEFAULT_CURRENCY.to_string(),
        })
    }
}

/// Tickers, index codes and FX pairs: `BRK.B`, `^GSPC`, `EURUSD=X`, `CL=F`.
fn is_ticker(symbol: &str) -> bool {
    symbol.len() <= 32
        && symbol.chars().any(|c| c.is_ascii_alphanumeric())
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'))
}

/// Fixed price table for development & testing.
/// Records every symbol it is asked about.
#[derive(Default)]
pub struct StaticPriceProvider {
    prices: HashMap<String, Option<f64>>,
    requests: Mutex<Vec<String>>,
}

impl StaticPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), Some(price));
        self
    }

    /// Symbol the provider knows but has no price for.
    pub fn without_price(mut self, symbol: &str) -> Self {
        self.prices.insert(symbol.to_string(), None);
        self
    }

    pub fn requested_symbols(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MarketDataProvider for StaticPriceProvider {
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(symbol.to_string());
        }

        Ok(self.prices.get(symbol).copied().flatten())
    }
}
