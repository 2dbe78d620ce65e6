use anyhow::Result;
use async_trait::async_trait;

use crate::types::OcrResult;

/// A remote OCR service that turns a document URL into recognised text.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Service name used in logs and errors (e.g., "azure-di").
    fn name(&self) -> &str;

    /// Submit the document and wait until analysis completes.
    async fn analyze(&self, document_url: &str) -> Result<OcrResult>;
}

/// Trait for text-generation providers used by the content reviewer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub model: String,
    pub user_prompt: String,
    /// `None` leaves the limit to the provider.
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
