//! Per-page word and confidence summary of an OCR result.

use std::fmt;
use std::io::{self, Write};

use docintel_core::{OcrResult, Page};

/// Counts and mean word confidence for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub page_number: u32,
    pub line_count: usize,
    pub word_count: usize,
    /// `None` when the page has no words.
    pub average_confidence: Option<f64>,
}

impl PageSummary {
    pub fn from_page(page: &Page) -> Self {
        let word_count = page.words.len();
        let average_confidence = if word_count > 0 {
            let total: f64 = page.words.iter().map(|w| w.confidence).sum();
            Some(total / word_count as f64)
        } else {
            None
        };

        Self {
            page_number: page.page_number,
            line_count: page.lines.len(),
            word_count,
            average_confidence,
        }
    }

    /// The average rounded to two decimal places.
    pub fn rounded_confidence(&self) -> Option<f64> {
        self.average_confidence.map(|c| (c * 100.0).round() / 100.0)
    }
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document Page {} has {} lines and {} words.",
            self.page_number, self.line_count, self.word_count
        )?;
        if let Some(confidence) = self.rounded_confidence() {
            write!(f, "\nAverage Confidence: {confidence:.2}")?;
        }
        Ok(())
    }
}

/// Summaries for every page, in page order. Averages never span pages.
pub fn summarize_pages(result: &OcrResult) -> Vec<PageSummary> {
    result.pages.iter().map(PageSummary::from_page).collect()
}

/// Print the summary block for `result` to `out`.
pub fn write_summary<W: Write>(result: &OcrResult, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Document Summary")?;
    writeln!(out, "----------------")?;
    for summary in summarize_pages(result) {
        writeln!(out, "{summary}")?;
    }
    Ok(())
}
