//! Decoding language-model replies into a [`ReviewRecord`].
//!
//! Models are asked for a bare JSON object but often wrap it in a Markdown
//! fence or add prose around it, braces included. The reply is scanned for the
//! first `{` at which a complete record decodes; anything after it is ignored.

use docintel_core::{ReviewError, ReviewRecord};
use serde_json::json;

/// JSON schema of [`ReviewRecord`] as shown to the model.
pub fn review_schema() -> serde_json::Value {
    json!({
        "properties": {
            "summary": {
                "title": "Summary",
                "description": "gives a summary of the document sent for analysis",
                "type": "string"
            },
            "interesting_fact": {
                "title": "Interesting Fact",
                "description": "points out a interesting fact of the document sent for analysis",
                "type": "string"
            }
        },
        "required": ["summary", "interesting_fact"]
    })
}

/// Instructions appended to the prompt telling the model how to shape its reply.
pub fn format_instructions() -> String {
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         \n\
         As an example, for the schema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
         the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
         The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\
         \n\
         Here is the output schema:\n\
         ```\n\
         {}\n\
         ```",
        review_schema()
    )
}

/// Parse a model reply into a [`ReviewRecord`].
///
/// Fails with [`ReviewError::SchemaParse`] when the reply holds no JSON object,
/// or no object in it decodes (invalid JSON, missing or non-string field). The
/// error reported is the one from the first object tried.
pub fn parse_review(reply: &str) -> Result<ReviewRecord, ReviewError> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(ReviewError::SchemaParse("empty reply".to_string()));
    }

    let mut first_error = None;
    for (start, _) in reply.match_indices('{') {
        let mut stream =
            serde_json::Deserializer::from_str(&reply[start..]).into_iter::<ReviewRecord>();
        match stream.next() {
            Some(Ok(record)) => return Ok(record),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    Err(match first_error {
        Some(e) => ReviewError::SchemaParse(e.to_string()),
        None => ReviewError::SchemaParse("no JSON object found in reply".to_string()),
    })
}
