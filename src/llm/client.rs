// Completion endpoint client.
//
// One blocking round trip per call, no streaming, no retry. The endpoint's
// response shape is not guaranteed: depending on deployment the answer text
// arrives at `output.choices[0].text` or at `choices[0].text`, so both are
// recognized and anything else is an explicit malformed-reply error.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmConfig, DEFAULT_BASE_URL};
use crate::types::{AppError, AppResult};

pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn from_config(config: &LlmConfig, prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            prompt,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stop: config.stop.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChoiceList {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct WrappedReply {
    output: ChoiceList,
}

#[derive(Debug, Deserialize)]
struct ApiErrorReply {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The recognized completion response shapes.
#[derive(Debug, PartialEq)]
pub enum CompletionReply {
    /// `{"output": {"choices": [{"text": ...}]}}`
    Wrapped { text: String },
    /// `{"choices": [{"text": ...}]}`
    Flat { text: String },
    /// Anything else, including an empty choice list.
    Unrecognized,
}

impl CompletionReply {
    pub fn from_value(value: &serde_json::Value) -> Self {
        if let Ok(reply) = serde_json::from_value::<WrappedReply>(value.clone()) {
            if let Some(choice) = reply.output.choices.into_iter().next() {
                return CompletionReply::Wrapped { text: choice.text };
            }
        }
        if let Ok(reply) = serde_json::from_value::<ChoiceList>(value.clone()) {
            if let Some(choice) = reply.choices.into_iter().next() {
                return CompletionReply::Flat { text: choice.text };
            }
        }
        CompletionReply::Unrecognized
    }

    /// Extract the trimmed answer text, or the malformed-reply error kind.
    pub fn answer_text(&self) -> AppResult<&str> {
        match self {
            CompletionReply::Wrapped { text } | CompletionReply::Flat { text } => Ok(text.trim()),
            CompletionReply::Unrecognized => Err(AppError::MalformedReply),
        }
    }
}

impl CompletionClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: &str, base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Send one completion request and extract the answer text.
    pub async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        let url = format!("{}/v1/completions", self.base_url);

        debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Completion(format!("request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(reply) = serde_json::from_str::<ApiErrorReply>(&error_text) {
                return Err(AppError::Completion(format!(
                    "API error ({}): {}",
                    status, reply.error.message
                )));
            }

            return Err(AppError::Completion(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Completion(format!("failed to read response body: {}", e)))?;

        CompletionReply::from_value(&value)
            .answer_text()
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_shape_is_recognized_and_trimmed() {
        let value = json!({"output": {"choices": [{"text": " hi "}]}});
        let reply = CompletionReply::from_value(&value);
        assert_eq!(reply.answer_text().unwrap(), "hi");
        assert!(matches!(reply, CompletionReply::Wrapped { .. }));
    }

    #[test]
    fn test_flat_shape_is_recognized() {
        let value = json!({"choices": [{"text": "hi"}]});
        let reply = CompletionReply::from_value(&value);
        assert_eq!(reply.answer_text().unwrap(), "hi");
        assert!(matches!(reply, CompletionReply::Flat { .. }));
    }

    #[test]
    fn test_unrecognized_shape_is_an_explicit_error() {
        for value in [
            json!({"result": "hi"}),
            json!({"choices": []}),
            json!({"output": {"choices": []}}),
            json!(null),
        ] {
            let reply = CompletionReply::from_value(&value);
            assert_eq!(reply, CompletionReply::Unrecognized);
            assert!(matches!(
                reply.answer_text(),
                Err(AppError::MalformedReply)
            ));
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            prompt: "system: hi\nuser: hello\n".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            stop: vec!["Human:".to_string(), "Assistant:".to_string()],
        }
    }

    #[tokio::test]
    async fn test_complete_happy_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"output": {"choices": [{"text": "  the answer  "}]}}"#)
            .create_async()
            .await;

        let client = CompletionClient::with_base_url("test-key", server.url());
        let answer = client.complete(&request()).await.unwrap();
        assert_eq!(answer, "the answer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_flat_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"text": "42"}]}"#)
            .create_async()
            .await;

        let client = CompletionClient::with_base_url("test-key", server.url());
        assert_eq!(client.complete(&request()).await.unwrap(), "42");
    }

    #[tokio::test]
    async fn test_complete_unrecognized_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;

        let client = CompletionClient::with_base_url("test-key", server.url());
        assert!(matches!(
            client.complete(&request()).await,
            Err(AppError::MalformedReply)
        ));
    }

    #[tokio::test]
    async fn test_complete_api_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "invalid api key"}}"#)
            .create_async()
            .await;

        let client = CompletionClient::with_base_url("bad-key", server.url());
        match client.complete(&request()).await {
            Err(AppError::Completion(message)) => {
                assert!(message.contains("invalid api key"));
                assert!(message.contains("401"));
            }
            other => panic!("expected a completion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_unreachable_endpoint() {
        // Nothing listens on this port.
        let client =
            CompletionClient::with_base_url("test-key", "http://127.0.0.1:9".to_string());
        assert!(matches!(
            client.complete(&request()).await,
            Err(AppError::Completion(_))
        ));
    }
}
