//! Error types for the stock price assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Startup
    // =============================

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // =============================
    // Price Lookup
    // =============================

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("{0}")]
    PriceUnavailable(String),

    #[error("Market data provider error: {0}")]
    ProviderError(String),

    // =============================
    // Agent
    // =============================

    #[error("Agent error: {0}")]
    AgentError(String),

    #[error("Result validation failed: {0}")]
    SchemaValidation(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Tool '{tool}' failed: {source}")]
    ToolFailed {
        tool: String,
        #[source]
        source: Box<AssistantError>,
    },

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssistantError {
    /// Stable failure classification, independent of the message text.
    ///
    /// Tool failures report the kind of the error the tool raised, so a
    /// priceless symbol is `price_unavailable` whether or not it surfaced
    /// through the agent.
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantError::ConfigurationError(_) => "configuration",
            AssistantError::InvalidSymbol(_) => "invalid_symbol",
            AssistantError::PriceUnavailable(_) => "price_unavailable",
            AssistantError::ProviderError(_)
            | AssistantError::HttpError(_)
            | AssistantError::IoError(_) => "transport",
            AssistantError::AgentError(_) => "agent",
            AssistantError::SchemaValidation(_) | AssistantError::SerializationError(_) => {
                "schema_validation"
            }
            AssistantError::LlmError(_) => "llm",
            AssistantError::ToolNotFound(_) | AssistantError::InvalidToolInput(_) => "tool",
            AssistantError::ToolFailed { source, .. } => source.kind(),
        }
    }

    pub fn tool_failed(tool: impl Into<String>, source: AssistantError) -> Self {
        AssistantError::ToolFailed {
            tool: tool.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_keeps_inner_kind() {
        let err = AssistantError::tool_failed(
            "get_stock_price",
            AssistantError::PriceUnavailable("No price data found for symbol: XYZ".to_string()),
        );

        assert_eq!(err.kind(), "price_unavailable");
        assert_eq!(
            err.to_string(),
            "Tool 'get_stock_price' failed: No price data found for symbol: XYZ"
        );
    }

    #[test]
    fn test_configuration_message() {
        let err = AssistantError::ConfigurationError(
            "GROQ_API_KEY environment variable not set".to_string(),
        );
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }
}
