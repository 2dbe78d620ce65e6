pub mod mock;
pub mod ocr;
pub mod report;

pub use mock::MockAnalyzer;
pub use ocr::{AzureDocumentAnalyzer, API_VERSION, PREBUILT_READ};
pub use report::{summarize_pages, write_summary, PageSummary};
