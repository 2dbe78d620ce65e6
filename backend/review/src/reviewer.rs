//! Content reviewer: asks a language model for a summary and an interesting
//! fact about the recognised text of a document.

use std::sync::Arc;

use anyhow::{Context, Result};
use docintel_core::{LlmProvider, LlmRequest, OcrResult, ReviewRecord};
use tracing::{debug, info, warn};

use crate::parser::parse_review;
use crate::prompt::render_review_prompt;

pub struct ContentReviewer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl ContentReviewer {
    /// A reviewer using deterministic sampling (temperature 0).
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    /// Build the completion request for `result`.
    pub fn build_request(&self, result: &OcrResult) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            user_prompt: render_review_prompt(&result.content()),
            max_tokens: None,
            temperature: self.temperature,
        }
    }

    /// Send the document text to the model and return its raw reply.
    ///
    /// The reply is validated against [`ReviewRecord`] first; a reply that does
    /// not decode fails with a schema error instead of being returned.
    pub async fn review(&self, result: &OcrResult) -> Result<String> {
        Ok(self.review_with_record(result).await?.0)
    }

    /// Like [`ContentReviewer::review`], also returning the decoded record.
    pub async fn review_with_record(&self, result: &OcrResult) -> Result<(String, ReviewRecord)> {
        let request = self.build_request(result);
        info!(
            provider = self.provider.name(),
            model = %self.model,
            "Sending scanned document to the language model"
        );

        let response = self
            .provider
            .complete(&request)
            .await
            .with_context(|| format!("{} completion failed", self.provider.name()))?;
        debug!(
            provider = %response.provider,
            model = %response.model,
            tokens_used = response.tokens_used,
            latency_ms = response.latency_ms,
            "Language model replied"
        );

        let record = parse_review(&response.content)?;
        if record.summary_exceeds_limit() {
            warn!(
                chars = record.summary.chars().count(),
                "Summary is longer than the requested 300 characters"
            );
        }

        Ok((response.content, record))
    }
}
