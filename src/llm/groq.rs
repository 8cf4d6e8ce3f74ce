//! Groq API client
//!
//! OpenAI-compatible `/chat/completions` with function tools.
//! Uses a long-lived reqwest::Client for connection pooling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{ChatMessage, LlmClient};
use crate::error::AssistantError;
use crate::models::ToolSpec;
use crate::Result;

const TEMPERATURE: f32 = 0.0;

/// Reusable Groq client (connection-pooled)
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = CompletionRequest {
            model: &self.model,
            messages,
            tools: tools.iter().map(ToolDefinition::from).collect(),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            temperature: TEMPERATURE,
        };

        info!(model = %self.model, messages = messages.len(), "Calling Groq API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Groq API request failed: {}", e);
                AssistantError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Groq API error response ({}): {}", status, error_text);
            return Err(AssistantError::LlmError(format!(
                "Groq API returned {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Groq response: {}", e);
            AssistantError::LlmError(format!("Groq parse error: {}", e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::LlmError("No choices in Groq response".to_string()))?;

        if let Some(usage) = completion.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
                "Groq response received"
            );
        }

        Ok(choice.message)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ToolDefinition<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinition<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionDefinition<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolSpec> for ToolDefinition<'a> {
    fn from(spec: &'a ToolSpec) -> Self {
        Self {
            kind: "function",
            function: FunctionDefinition {
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.parameters,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GroqClient {
        GroqClient::new(
            "gsk_test",
            "llama3-groq-70b-8192-tool-use-preview",
            format!("{}/openai/v1", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn price_tool() -> ToolSpec {
        ToolSpec {
            name: "get_stock_price".to_string(),
            description: "Fetch the current stock price for a given symbol".to_string(),
            parameters: json!({"type": "object", "properties": {"symbol": {"type": "string"}}}),
        }
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage::user("What is Apple's current stock price?")];
        let tools = vec![price_tool()];
        let request = CompletionRequest {
            model: "m",
            messages: &messages,
            tools: tools.iter().map(ToolDefinition::from).collect(),
            tool_choice: Some("auto"),
            temperature: 0.0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "get_stock_price");
        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_parses_tool_call_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(json!({
                "model": "llama3-groq-70b-8192-tool-use-preview",
                "tool_choice": "auto"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": {
                                "name": "get_stock_price",
                                "arguments": "{\"symbol\": \"AAPL\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": { "prompt_tokens": 120, "completion_tokens": 18, "total_tokens": 138 }
            })))
            .mount(&server)
            .await;

        let turn = client(&server)
            .complete(&[ChatMessage::user("Apple?")], &[price_tool()])
            .await
            .unwrap();

        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, None);
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].id, "call_abc");
        assert_eq!(turn.tool_calls[0].function.name, "get_stock_price");
    }

    #[tokio::test]
    async fn test_error_status_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "Invalid API Key"}})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "llm");
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("No choices"));
    }
}
