pub mod parser;
pub mod prompt;
pub mod providers;
pub mod reviewer;

pub use parser::{format_instructions, parse_review};
pub use prompt::render_review_prompt;
pub use reviewer::ContentReviewer;
