use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

/// Black-box text completion backend returning a structured JSON object.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<Value, CompletionError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion transport failed: {0}")]
    Transport(String),
    #[error("completion backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response was not structured output: {0}")]
    Unstructured(String),
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

impl<T: CompletionClient> CompletionClient for std::sync::Arc<T> {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<Value, CompletionError>> + Send {
        (**self).complete(prompt)
    }
}

/// Client for OpenAI-compatible chat completion endpoints in JSON mode.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, prompt: &str) -> Result<Value, CompletionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "sending completion request");

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "completion backend error");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| CompletionError::Unstructured(err.to_string()))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Unstructured("response had no content".to_string()))?;

        parse_structured_content(&content)
    }
}

impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<Value, CompletionError> {
        self.send(prompt).await
    }
}

/// Parse model output as a JSON object, tolerating a surrounding markdown code fence.
pub(crate) fn parse_structured_content(content: &str) -> Result<Value, CompletionError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    let value: Value = serde_json::from_str(unfenced)
        .map_err(|err| CompletionError::Unstructured(err.to_string()))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(CompletionError::Unstructured(
            "expected a JSON object".to_string(),
        ))
    }
}
