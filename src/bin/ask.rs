use stock_price_assistant::{
    config::AppConfig,
    handler::QueryHandler,
    logging::{init_logging, Console},
};
use tracing::info;

/// One-shot query from the command line:
/// `ask What is Apple's current stock price?`
///
/// The answer is the only thing written to stdout; logs go to stderr.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = init_logging(&AppConfig::log_dir_from_env(), Console::Stderr)?;

    let config = AppConfig::from_env()?;
    let handler = QueryHandler::from_config(&config)?;

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    info!(query = %query, "Running one-shot query");

    println!("{}", handler.handle(&query).await);

    Ok(())
}
