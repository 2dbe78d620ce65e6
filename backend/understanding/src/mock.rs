use anyhow::Result;
use async_trait::async_trait;
use docintel_core::{DocumentAnalyzer, OcrResult, ReviewError};

/// A document analyzer that returns a canned result without touching the network.
pub struct MockAnalyzer {
    result: Option<OcrResult>,
    failure: Option<String>,
}

impl MockAnalyzer {
    pub fn new(result: OcrResult) -> Self {
        Self {
            result: Some(result),
            failure: None,
        }
    }

    /// An analyzer whose every call fails with a service error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: None,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for MockAnalyzer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, _document_url: &str) -> Result<OcrResult> {
        if let Some(message) = &self.failure {
            return Err(ReviewError::service("mock", message.clone()).into());
        }
        Ok(self.result.clone().unwrap_or_default())
    }
}
