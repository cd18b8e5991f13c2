//! Stock price tool — latest quote from Alpha Vantage `GLOBAL_QUOTE`.
//!
//! The upstream JSON body is handed to the model unchanged.

use crate::http;
use async_trait::async_trait;
use parley_config::ToolsConfig;
use parley_core::error::ToolError;
use parley_core::tool::{ArgType, ArgumentSchema, Tool};
use tracing::warn;

pub struct StockPriceTool {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl StockPriceTool {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: http::client("get_stock_price", timeout_secs)?,
        })
    }

    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        Self::new(
            &config.alpha_vantage_url,
            config.alpha_vantage_api_key.clone(),
            config.timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Fetch the latest stock price for a given symbol (e.g. 'AAPL', 'TSLA') using Alpha Vantage."
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new().required("symbol", ArgType::String, "The ticker symbol, e.g. 'AAPL'")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let symbol = arguments["symbol"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'symbol' argument".into()))?;

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(http::error_payload(
                "Alpha Vantage API key is not configured (set ALPHA_VANTAGE_API_KEY)",
            ));
        };

        let url = format!("{}/query", self.base_url);
        let query = [
            ("function", "GLOBAL_QUOTE"),
            ("symbol", symbol),
            ("apikey", api_key),
        ];

        match http::get_json(&self.client, &url, &query).await {
            Ok(body) => Ok(body),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Stock quote lookup failed");
                Ok(http::error_payload(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_upstream_body_verbatim() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "Global Quote": {"01. symbol": "AAPL", "05. price": "189.9100"}
        });
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("apikey", "demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let tool = StockPriceTool::new(server.uri(), Some("demo".into()), 5).unwrap();
        let out = tool
            .execute(serde_json::json!({"symbol": "AAPL"}))
            .await
            .unwrap();
        assert_eq!(out, body);
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error_payload() {
        let tool = StockPriceTool::new("http://127.0.0.1:9", None, 5).unwrap();
        let out = tool
            .execute(serde_json::json!({"symbol": "AAPL"}))
            .await
            .unwrap();
        assert!(out["error"].as_str().unwrap().contains("ALPHA_VANTAGE_API_KEY"));
    }

    #[tokio::test]
    async fn upstream_failure_is_an_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tool = StockPriceTool::new(server.uri(), Some("demo".into()), 5).unwrap();
        let out = tool
            .execute(serde_json::json!({"symbol": "TSLA"}))
            .await
            .unwrap();
        assert!(out["error"].as_str().unwrap().contains("500"));
    }
}
