//! Structured logging for docintel.
//!
//! Handles subscriber setup (console plus optional JSON file) and redaction of
//! credentials from strings before they reach a log line or an error message.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
