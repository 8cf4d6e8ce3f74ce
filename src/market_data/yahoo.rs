//! Yahoo Finance chart endpoint
//!
//! Uses the v8 chart API with a one-day range; `meta.regularMarketPrice` is
//! the latest traded price.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::MarketDataProvider;
use crate::error::AssistantError;
use crate::Result;

// The endpoint answers 429 to clients without a browser-like agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Reusable Yahoo Finance client (connection-pooled)
pub struct YahooFinanceProvider {
    client: Client,
    base_url: Url,
}

impl YahooFinanceProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url).map_err(|e| {
            AssistantError::ConfigurationError(format!(
                "invalid market data URL {}: {}",
                base_url, e
            ))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(AssistantError::ConfigurationError(format!(
                "market data URL cannot be a base: {}",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// `{base}/v8/finance/chart/{symbol}` with the symbol as one encoded segment.
    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AssistantError::ConfigurationError(format!(
                    "market data URL cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        let url = self.chart_url(symbol)?;

        debug!(%url, "Requesting chart data");

        let response = self
            .client
            .get(url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            warn!(symbol, "Chart endpoint has no data for symbol");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::ProviderError(format!(
                "Yahoo Finance returned {} for {}: {}",
                status, symbol, body
            )));
        }

        let payload: ChartResponse = response.json().await?;

        Ok(extract_price(payload))
    }
}

fn extract_price(payload: ChartResponse) -> Option<f64> {
    if let Some(err) = payload.chart.error {
        warn!(
            code = err.code.as_deref().unwrap_or(""),
            "Chart endpoint reported: {}",
            err.description.as_deref().unwrap_or("no description")
        );
        return None;
    }

    payload
        .chart
        .result?
        .into_iter()
        .next()?
        .meta?
        .regular_market_price
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> YahooFinanceProvider {
        YahooFinanceProvider::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_reads_regular_market_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("range", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{
                        "meta": {
                            "currency": "USD",
                            "symbol": "AAPL",
                            "regularMarketPrice": 150.1234
                        }
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let price = provider(&server).latest_price("AAPL").await.unwrap();
        assert_eq!(price, Some(150.1234));
    }

    #[tokio::test]
    async fn test_not_found_means_no_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/ZZZZINVALID"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": {
                        "code": "Not Found",
                        "description": "No data found, symbol may be delisted"
                    }
                }
            })))
            .mount(&server)
            .await;

        let price = provider(&server).latest_price("ZZZZINVALID").await.unwrap();
        assert_eq!(price, None);
    }

    #[tokio::test]
    async fn test_success_without_price_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/EMPTY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": { "result": [{ "meta": { "symbol": "EMPTY" } }], "error": null }
            })))
            .mount(&server)
            .await;

        let price = provider(&server).latest_price("EMPTY").await.unwrap();
        assert_eq!(price, None);
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
            .mount(&server)
            .await;

        let err = provider(&server).latest_price("AAPL").await.unwrap_err();
        assert!(matches!(err, AssistantError::ProviderError(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = provider(&server).latest_price("AAPL").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn test_symbol_is_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": { "result": [{ "meta": { "regularMarketPrice": 150.0 } }], "error": null }
            })))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider(&server);
        for symbol in ["AAPL#ZZZZINVALID", "ZZZZ/../AAPL", "AAPL?x=1"] {
            let price = provider.latest_price(symbol).await.unwrap();
            assert_eq!(price, None, "symbol {}", symbol);
        }
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/proxy/v8/finance/chart/MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": { "result": [{ "meta": { "regularMarketPrice": 410.5 } }], "error": null }
            })))
            .mount(&server)
            .await;

        let provider =
            YahooFinanceProvider::new(format!("{}/proxy/", server.uri()), Duration::from_secs(5))
                .unwrap();

        assert_eq!(provider.latest_price("MSFT").await.unwrap(), Some(410.5));
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        let err = YahooFinanceProvider::new("not a url", Duration::from_secs(5))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "configuration");
    }
}
