//! Core data models for the stock price assistant

use serde::{Deserialize, Serialize};

use crate::error::AssistantError;
use crate::Result;

pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Round a price to two fractional digits.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

//
// ================= Quote Result =================
//

/// Structured answer produced by the agent for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuoteResult {
    pub symbol: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub message: String,
}

impl StockQuoteResult {
    /// Reject records that must never reach the user as a success.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(AssistantError::SchemaValidation(
                "symbol must not be empty".to_string(),
            ));
        }

        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AssistantError::SchemaValidation(format!(
                "price must be a positive number, got {}",
                self.price
            )));
        }

        if self.currency.trim().is_empty() {
            return Err(AssistantError::SchemaValidation(
                "currency must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// JSON schema advertised to the model for the `final_result` tool.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "Ticker symbol that was priced" },
                "price": { "type": "number", "description": "Price returned by get_stock_price" },
                "currency": { "type": "string", "default": DEFAULT_CURRENCY },
                "message": { "type": "string", "description": "Short explanation for the user" }
            },
            "required": ["symbol", "price", "message"]
        })
    }
}

//
// ================= Price Quote =================
//

/// Result of a single price lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub currency: String,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

/// Tool advertisement sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}
