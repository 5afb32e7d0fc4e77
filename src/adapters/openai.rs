use crate::domain::ports::{CompletionClient, CompletionRequest, ConfigProvider};
use crate::utils::error::{CompletionError, ReportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// OpenAI 相容的 chat completions 客戶端
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    json_mode: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            json_mode: false,
        }
    }

    /// 由設定建立；設定中的逾時套用到每個請求
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| ReportError::MissingConfigError {
                field: "api_key".to_string(),
            })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ReportError::ConfigError {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            api_base: config.api_base().to_string(),
            api_key: api_key.to_string(),
            json_mode: config.json_mode(),
        })
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, CompletionError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: self.json_mode.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        };

        tracing::debug!("Making completion request to: {}", self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Completion response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::MalformedResponse {
                message: e.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::ServerConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-test".to_string(),
            system: "You are a test.".to_string(),
            prompt: "Say hello as JSON".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "gpt-test", "max_tokens": 2000}"#)
                .body_contains("You are a test.")
                .body_contains("Say hello as JSON");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "{\"hello\": \"world\"}"}},
                        {"message": {"role": "assistant", "content": "ignored"}}
                    ]
                }));
        });

        let client = OpenAiClient::new(server.url("/v1"), "test-key");
        let text = client.complete(&request()).await.unwrap();

        api_mock.assert();
        assert_eq!(text, "{\"hello\": \"world\"}");
    }

    #[tokio::test]
    async fn test_json_mode_sets_response_format() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"response_format": {"type": "json_object"}}"#);
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": "{}"}}]}));
        });

        let client = OpenAiClient::new(server.base_url(), "test-key").with_json_mode(true);
        assert!(client.complete(&request()).await.is_ok());
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_error_status_is_preserved() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limit exceeded");
        });

        let client = OpenAiClient::new(server.base_url(), "test-key");
        let err = client.complete(&request()).await.unwrap_err();

        api_mock.assert();
        match err {
            CompletionError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limit exceeded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": null}}]}));
        });

        let client = OpenAiClient::new(server.base_url(), "test-key");
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_missing_choices_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let client = OpenAiClient::new(server.base_url(), "test-key");
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_configured_timeout_applies_to_requests() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(std::time::Duration::from_secs(3))
                .json_body(json!({"choices": [{"message": {"content": "{}"}}]}));
        });

        let api_base = server.url("/v1");
        let config = ServerConfig::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("test-key".to_string()),
            "OPENAI_API_BASE" => Some(api_base.clone()),
            "REQUEST_TIMEOUT_SECONDS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.request_timeout(), Some(std::time::Duration::from_secs(1)));

        let client = OpenAiClient::from_config(&config).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        match err {
            CompletionError::Http(e) => assert!(e.is_timeout(), "{}", e),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body("<html>gateway</html>");
        });

        let client = OpenAiClient::new(server.base_url(), "test-key");
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse { .. }));
    }
}
