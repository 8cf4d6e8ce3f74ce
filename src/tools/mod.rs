//! Tool trait and registry
//!
//! Tools are what the model may call. Each one declares a JSON schema for
//! its arguments and is looked up by name when a tool call arrives.

use crate::error::AssistantError;
use crate::market_data::PriceLookup;
use crate::models::{ToolInput, ToolOutput, ToolSpec};
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const STOCK_PRICE_TOOL: &str = "get_stock_price";

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the `parameters` object.
    fn parameters(&self) -> Value;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Specs for every registered tool, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AssistantError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

/// Informal names the model sometimes passes instead of a ticker.
const SYMBOL_ALIASES: &[(&str, &str)] = &[("OIL", "USO"), ("CRUDE", "USO"), ("CRUDE OIL", "USO")];

/// Canonical ticker form: trimmed, no leading `$`, uppercase, aliases resolved.
pub fn normalize_symbol(raw: &str) -> String {
    let symbol = raw.trim().trim_start_matches('$').trim().to_uppercase();

    SYMBOL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == symbol)
        .map(|(_, ticker)| ticker.to_string())
        .unwrap_or(symbol)
}

/// Looks up the latest price of one symbol.
pub struct StockPriceTool {
    lookup: PriceLookup,
}

impl StockPriceTool {
    pub fn new(lookup: PriceLookup) -> Self {
        Self { lookup }
    }
}

#[async_trait::async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &'static str {
        STOCK_PRICE_TOOL
    }

    fn description(&self) -> &'static str {
        "Fetch the current stock price for a given symbol. Returns price and currency."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The stock symbol to look up, e.g. AAPL"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        let raw = input
            .parameters
            .get("symbol")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AssistantError::InvalidToolInput("Expected 'symbol' in tool_input".to_string())
            })?;

        let symbol = normalize_symbol(raw);
        let quote = self.lookup.lookup(&symbol).await?;

        Ok(ToolOutput {
            success: true,
            data: json!({
                "symbol": symbol,
                "price": quote.price,
                "currency": quote.currency,
            }),
            error: None,
        })
    }
}

/// Create a registry with the price lookup tool.
pub fn create_default_registry(lookup: PriceLookup) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(StockPriceTool::new(lookup)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::StaticPriceProvider;

    fn input(parameters: Value) -> ToolInput {
        ToolInput {
            tool_name: STOCK_PRICE_TOOL.to_string(),
            parameters,
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl "), "AAPL");
        assert_eq!(normalize_symbol("$msft"), "MSFT");
        assert_eq!(normalize_symbol("oil"), "USO");
        assert_eq!(normalize_symbol("Crude Oil"), "USO");
        assert_eq!(normalize_symbol("BRK-B"), "BRK-B");
    }

    #[test]
    fn test_registry_specs() {
        let provider = Arc::new(StaticPriceProvider::new());
        let registry = create_default_registry(PriceLookup::new(provider));

        assert_eq!(registry.list(), vec![STOCK_PRICE_TOOL]);
        let specs = registry.specs();
        assert_eq!(specs[0].parameters["required"][0], "symbol");
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_stock_price_tool_returns_quote() {
        let provider = Arc::new(StaticPriceProvider::new().with_price("USO", 78.456));
        let tool = StockPriceTool::new(PriceLookup::new(provider.clone()));

        let output = tool.execute(&input(json!({"symbol": "oil"}))).await.unwrap();

        assert!(output.success);
        assert_eq!(output.data["symbol"], "USO");
        assert_eq!(output.data["price"], 78.46);
        assert_eq!(output.data["currency"], "USD");
        assert_eq!(provider.requested_symbols(), vec!["USO".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_symbol_argument() {
        let provider = Arc::new(StaticPriceProvider::new());
        let tool = StockPriceTool::new(PriceLookup::new(provider));

        let err = tool.execute(&input(json!({"ticker": "AAPL"}))).await.unwrap_err();
        assert!(matches!(err, AssistantError::InvalidToolInput(_)));

        let err = tool.execute(&input(json!("AAPL"))).await.unwrap_err();
        assert!(matches!(err, AssistantError::InvalidToolInput(_)));
    }
}
