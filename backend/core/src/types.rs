use serde::{Deserialize, Serialize};

/// Soft character limit requested for [`ReviewRecord::summary`]; not enforced.
pub const SUMMARY_SOFT_LIMIT: usize = 300;

/// Text recognised in one document, page by page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub pages: Vec<Page>,
}

impl OcrResult {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Every line's content, page order then line order, each followed by `\n`.
    pub fn content(&self) -> String {
        let mut content = String::new();
        for page in &self.pages {
            for line in &page.lines {
                content.push_str(&line.content);
                content.push('\n');
            }
        }
        content
    }
}

/// One page of an [`OcrResult`]. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub lines: Vec<Line>,
    pub words: Vec<Word>,
}

impl Page {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            lines: Vec::new(),
            words: Vec::new(),
        }
    }

    pub fn with_line(mut self, content: impl Into<String>) -> Self {
        self.lines.push(Line {
            content: content.into(),
        });
        self
    }

    pub fn with_word(mut self, content: impl Into<String>, confidence: f64) -> Self {
        self.words.push(Word {
            content: content.into(),
            confidence,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub content: String,
}

/// A recognised word and the service's confidence in it, expected in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub content: String,
    pub confidence: f64,
}

/// The two-field record a language model is asked to produce for a document.
///
/// Both fields are required when decoding; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Short summary of the document.
    pub summary: String,
    /// An interesting fact found in the document.
    pub interesting_fact: String,
}

impl ReviewRecord {
    pub fn summary_exceeds_limit(&self) -> bool {
        self.summary.chars().count() > SUMMARY_SOFT_LIMIT
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": self.summary,
            "interesting_fact": self.interesting_fact,
        })
    }
}
