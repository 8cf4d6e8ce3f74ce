//! Stock Price Assistant
//!
//! Natural-language stock price lookup:
//! - A tool-calling LLM agent extracts the ticker from free text
//! - Prices come from a market data provider through a validating lookup
//! - The agent's answer is schema-checked before anyone sees it
//! - The query handler turns every outcome into display text
//!
//! FLOW:
//! QUERY → AGENT → get_stock_price → AGENT → VALIDATE → FORMAT

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod llm;
pub mod logging;
pub mod market_data;
pub mod models;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::StockAgent;
pub use handler::QueryHandler;
