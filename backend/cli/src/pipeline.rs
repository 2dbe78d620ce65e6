use std::io::Write;

use anyhow::{Context, Result};
use docintel_core::{DocumentAnalyzer, ReviewError};
use docintel_review::ContentReviewer;
use docintel_understanding::write_summary;
use tracing::info;

/// Analyse one document, print its summary, and return the model's review.
///
/// Everything user-visible is written to `out`: the per-page summary followed
/// by the raw reply text.
pub async fn run_pipeline<W: Write>(
    analyzer: &dyn DocumentAnalyzer,
    reviewer: &ContentReviewer,
    document_url: &str,
    out: &mut W,
) -> Result<String> {
    info!(analyzer = analyzer.name(), document = %document_url, "Analysing document");
    let result = analyzer.analyze(document_url).await.with_context(|| {
        format!("Failed to analyse document {document_url} with {}", analyzer.name())
    })?;
    if result.is_empty() {
        return Err(ReviewError::EmptyDocument.into());
    }

    write_summary(&result, out).context("Failed to write document summary")?;

    let reply = reviewer
        .review(&result)
        .await
        .context("Failed to review document content")?;

    writeln!(out)?;
    writeln!(out, "OpenAI Response")?;
    writeln!(out, "---------------")?;
    writeln!(out, "{reply}")?;
    out.flush()?;

    info!(pages = result.pages.len(), "Document review complete");
    Ok(reply)
}
