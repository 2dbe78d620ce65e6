pub mod error;
pub mod traits;
pub mod types;

pub use error::ReviewError;
pub use traits::{DocumentAnalyzer, LlmProvider, LlmRequest, LlmResponse};
pub use types::{Line, OcrResult, Page, ReviewRecord, Word, SUMMARY_SOFT_LIMIT};
