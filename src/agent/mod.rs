//! Symbol extraction agent
//!
//! QUERY → MODEL → TOOL CALLS → MODEL → ... → final_result → VALIDATE
//!
//! The model picks the instrument and calls `get_stock_price`; it answers by
//! calling `final_result` with a `StockQuoteResult`. The answer is only
//! accepted if it parses, validates, and names a symbol that was actually
//! priced during this run. The looked-up price always wins over whatever
//! number the model wrote.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::AssistantError;
use crate::llm::{ChatMessage, LlmClient, ToolCall};
use crate::models::{PriceQuote, StockQuoteResult, ToolInput, ToolSpec};
use crate::tools::{normalize_symbol, ToolRegistry, STOCK_PRICE_TOOL};
use crate::Result;

pub const FINAL_RESULT_TOOL: &str = "final_result";

const SYSTEM_PROMPT: &str = r#"You are a helpful financial assistant that can look up stock prices.
Extract the stock symbol from the query and use the get_stock_price tool to fetch current data.
For oil prices, use 'USO' as the symbol.
When you have the price, call final_result with the symbol, the price returned by the tool, the currency and a short message for the user.
Never invent a price."#;

// Prices are rounded to cents, so anything closer than half a cent is the same price.
const PRICE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    /// Model round-trips allowed per query.
    pub max_steps: u32,
    /// Invalid final answers the model may correct before the run fails.
    pub max_result_retries: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: 8,
            max_result_retries: 1,
        }
    }
}

/// Single-turn, tool-augmented agent producing a `StockQuoteResult`
pub struct StockAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    settings: AgentSettings,
}

#[derive(Debug, Deserialize)]
struct PricedSymbol {
    symbol: String,
    price: f64,
    currency: String,
}

impl StockAgent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            settings: AgentSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    fn tool_specs(&self) -> Vec<ToolSpec> {
        let mut specs = self.tools.specs();
        specs.push(ToolSpec {
            name: FINAL_RESULT_TOOL.to_string(),
            description: "Return the final answer to the user".to_string(),
            parameters: StockQuoteResult::json_schema(),
        });
        specs
    }

    /// Resolve the query to a validated quote.
    pub async fn run(&self, query: &str) -> Result<StockQuoteResult> {
        if query.trim().is_empty() {
            return Err(AssistantError::AgentError(
                "Query is empty. Ask about a stock, e.g. \"What is Apple's current stock price?\""
                    .to_string(),
            ));
        }

        info!(query, "Agent: starting run");

        let specs = self.tool_specs();
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(query)];
        let mut priced: HashMap<String, PriceQuote> = HashMap::new();
        let mut retries = 0;

        for step in 1..=self.settings.max_steps {
            let mut turn = self.llm.complete(&messages, &specs).await?;
            // An assistant message needs either content or tool calls.
            if turn.content.is_none() && turn.tool_calls.is_empty() {
                turn.content = Some(String::new());
            }
            messages.push(turn.clone());

            debug!(
                step,
                tool_calls = turn.tool_calls.len(),
                has_content = turn.content.is_some(),
                "Model turn received"
            );

            // === TEXT ANSWER ===
            if turn.tool_calls.is_empty() {
                let text = turn.content.as_deref().unwrap_or_default();
                match parse_text_result(text).and_then(|r| accept_result(r, &priced)) {
                    Ok(result) => return Ok(self.finish(result)),
                    Err(e) => {
                        let feedback = self.retry_or_fail(&mut retries, e)?;
                        messages.push(ChatMessage::user(feedback));
                        continue;
                    }
                }
            }

            // === TOOL CALLS ===
            let (finals, calls): (Vec<&ToolCall>, Vec<&ToolCall>) = turn
                .tool_calls
                .iter()
                .partition(|c| c.function.name == FINAL_RESULT_TOOL);

            for call in calls {
                let output = self.call_tool(call).await?;

                if call.function.name == STOCK_PRICE_TOOL {
                    let quote: PricedSymbol = serde_json::from_value(output.clone())?;
                    priced.insert(
                        quote.symbol,
                        PriceQuote {
                            price: quote.price,
                            currency: quote.currency,
                        },
                    );
                }

                messages.push(ChatMessage::tool_result(&call.id, output.to_string()));
            }

            // === VALIDATE ===
            for call in finals {
                match parse_arguments::<StockQuoteResult>(&call.function.arguments)
                    .and_then(|r| accept_result(r, &priced))
                {
                    Ok(result) => return Ok(self.finish(result)),
                    Err(e) => {
                        let feedback = self.retry_or_fail(&mut retries, e)?;
                        messages.push(ChatMessage::tool_result(&call.id, feedback));
                    }
                }
            }
        }

        Err(AssistantError::AgentError(format!(
            "No final result after {} model steps",
            self.settings.max_steps
        )))
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<Value> {
        let name = call.function.name.as_str();
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AssistantError::ToolNotFound(name.to_string()))?;

        let input = ToolInput {
            tool_name: name.to_string(),
            parameters: parse_arguments::<Value>(&call.function.arguments)
                .map_err(|e| AssistantError::tool_failed(name, e))?,
        };

        debug!(tool = name, parameters = %input.parameters, "Calling tool");

        match tool.execute(&input).await {
            Ok(output) => Ok(output.data),
            Err(e) => {
                error!(tool = name, error = %e, "Tool execution failed");
                Err(AssistantError::tool_failed(name, e))
            }
        }
    }

    /// Returns the feedback to send back to the model, or the terminal error.
    fn retry_or_fail(&self, retries: &mut u32, err: AssistantError) -> Result<String> {
        let reason = match err {
            AssistantError::SchemaValidation(reason) => reason,
            other => other.to_string(),
        };

        if *retries >= self.settings.max_result_retries {
            return Err(AssistantError::SchemaValidation(reason));
        }

        *retries += 1;
        warn!(attempt = *retries, %reason, "Final result rejected - asking model to fix it");

        Ok(format!(
            "Validation error: {}. Call {} to look up the price if you have not, then call {} again with a valid result.",
            reason, STOCK_PRICE_TOOL, FINAL_RESULT_TOOL
        ))
    }

    fn finish(&self, result: StockQuoteResult) -> StockQuoteResult {
        info!(symbol = %result.symbol, price = result.price, "Agent: result accepted");
        result
    }
}

/// Parse tool-call arguments. Some models send an empty string for no arguments.
fn parse_arguments<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| {
        AssistantError::SchemaValidation(format!("arguments are not valid JSON for this call: {}", e))
    })
}

/// Accept a plain JSON answer, optionally inside a ```json fence.
fn parse_text_result(text: &str) -> Result<StockQuoteResult> {
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if cleaned.is_empty() {
        return Err(AssistantError::SchemaValidation(
            "the model returned no result".to_string(),
        ));
    }

    serde_json::from_str(cleaned).map_err(|e| {
        AssistantError::SchemaValidation(format!("answer is not a valid stock result: {}", e))
    })
}

/// Hard contract check: the record is well-formed and its price came from a lookup.
fn accept_result(
    result: StockQuoteResult,
    priced: &HashMap<String, PriceQuote>,
) -> Result<StockQuoteResult> {
    result.validate()?;

    let symbol = normalize_symbol(&result.symbol);
    let quote = priced.get(&symbol).ok_or_else(|| {
        AssistantError::SchemaValidation(format!(
            "symbol {} was not priced with {}",
            symbol, STOCK_PRICE_TOOL
        ))
    })?;

    if (result.price - quote.price).abs() > PRICE_TOLERANCE {
        return Err(AssistantError::SchemaValidation(format!(
            "price {} does not match looked-up price {} for {}",
            result.price, quote.price, symbol
        )));
    }

    Ok(StockQuoteResult {
        symbol,
        price: quote.price,
        currency: quote.currency.clone(),
        message: result.message,
    })
}
