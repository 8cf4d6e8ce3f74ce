use stock_price_assistant::{
    api::start_server,
    config::AppConfig,
    handler::QueryHandler,
    logging::{init_logging, Console},
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = init_logging(&AppConfig::log_dir_from_env(), Console::Stdout)?;

    // Missing credential stops the process here, before anything is served.
    let config = AppConfig::from_env()?;

    info!("Starting Stock Price AI Assistant");
    info!("Model: {}", config.groq_model);
    info!("Port: {}", config.port);

    let handler = Arc::new(QueryHandler::from_config(&config)?);

    start_server(handler, config.port).await?;

    Ok(())
}
