//! `docintel-config` — runtime settings for the docintel pipeline.
//!
//! Provides:
//! - `.env` file loading
//! - Typed settings built from environment variables, with explicit credential checks
//! - Secret masking for safe logging/display

pub mod env;
pub mod redact;

pub use env::{
    load_env_file, Settings, AZURE_ENDPOINT, AZURE_KEY, DEFAULT_DOCUMENT_URL,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL,
};
pub use redact::{mask_secret, redact};
