use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use docintel_core::{LlmProvider, LlmRequest, LlmResponse, ReviewError};
use docintel_logging::redact_sensitive_data;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "openai";

/// OpenAI chat-completions provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_messages(request: &LlmRequest) -> Vec<ChatMessage> {
    vec![ChatMessage {
        role: "user".to_string(),
        content: request.user_prompt.clone(),
    }]
}

fn first_choice(response: ChatResponse) -> Result<(String, u64), ReviewError> {
    let tokens_used = response
        .usage
        .and_then(|u| u.total_tokens)
        .unwrap_or(0);
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ReviewError::service(PROVIDER, "response contained no choices"))?;
    Ok((content, tokens_used))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        let body = ChatRequest {
            model: request.model.clone(),
            messages: build_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            model = %request.model,
            temperature = request.temperature,
            prompt_chars = request.user_prompt.len(),
            "Sending request to OpenAI"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReviewError::service(PROVIDER, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ReviewError::service(
                PROVIDER,
                format!("returned {}: {}", status, redact_sensitive_data(&error_body)),
            )
            .into());
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            ReviewError::service(PROVIDER, format!("failed to parse response: {e}"))
        })?;
        let (content, tokens_used) = first_choice(chat_response)?;

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(tokens_used, latency_ms, "OpenAI reply received");

        Ok(LlmResponse {
            content,
            provider: PROVIDER.to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms,
        })
    }
}
