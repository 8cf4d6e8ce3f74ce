//! Query handler
//!
//! The one place where failures become text. `handle` is total: whatever
//! happens below it, the caller gets a displayable string.

use std::sync::Arc;

use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::agent::StockAgent;
use crate::config::AppConfig;
use crate::llm::GroqClient;
use crate::market_data::{PriceLookup, YahooFinanceProvider};
use crate::models::StockQuoteResult;
use crate::tools::create_default_registry;
use crate::Result;

pub const ERROR_PREFIX: &str = "Error: ";

pub struct QueryHandler {
    agent: Arc<StockAgent>,
}

impl QueryHandler {
    pub fn new(agent: Arc<StockAgent>) -> Self {
        Self { agent }
    }

    /// Wire the production stack: Groq for the model, Yahoo Finance for prices.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = YahooFinanceProvider::new(&config.market_data_base_url, config.http_timeout)?;
        let registry = create_default_registry(PriceLookup::new(Arc::new(provider)));

        let llm = GroqClient::new(
            &config.groq_api_key,
            &config.groq_model,
            &config.groq_base_url,
            config.http_timeout,
        )?;

        let agent = StockAgent::new(Arc::new(llm), registry);
        Ok(Self::new(Arc::new(agent)))
    }

    /// Answer a free-text question about a stock price.
    pub async fn handle(&self, query: &str) -> String {
        let span = tracing::info_span!("query", request_id = %Uuid::new_v4());

        async {
            info!("Processing query: {}", query);

            match self.agent.run(query).await {
                Ok(result) => format_result(&result),
                Err(e) => {
                    let error_msg = format!("Error processing query: {}", e);
                    error!(kind = e.kind(), "{}", error_msg);
                    format!("{}{}", ERROR_PREFIX, error_msg)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// `Stock: <symbol>`, `Price: $<price> <currency>`, blank line, message.
pub fn format_result(result: &StockQuoteResult) -> String {
    let mut response = format!("Stock: {}\n", result.symbol);
    response.push_str(&format!(
        "Price: ${:.2} {}\n",
        result.price, result.currency
    ));
    response.push_str(&format!("\n{}", result.message));
    response
}
