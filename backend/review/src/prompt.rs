use crate::parser::format_instructions;

const REVIEW_TEMPLATE: &str = "given this document {document_content} I want you to analyse and give a:
1: summary (300 characters Maximum)
2: interesting fact

{format_instructions}
";

/// Render the review prompt for `document_content`.
pub fn render_review_prompt(document_content: &str) -> String {
    // Instructions go in first so document text containing the placeholder is left untouched.
    REVIEW_TEMPLATE
        .replace("{format_instructions}", &format_instructions())
        .replacen("{document_content}", document_content, 1)
}
