//! Environment loading and typed settings.
//!
//! Variables are read from the process environment after an optional `.env`
//! file has been merged in. Variables already set in the process win over the
//! file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docintel_core::ReviewError;
use serde_json::json;
use tracing::debug;

use crate::redact::{mask_secret, redact};

pub const AZURE_KEY: &str = "AZURE_KEY";
pub const AZURE_ENDPOINT: &str = "AZURE_ENDPOINT";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_DOCUMENT_URL: &str =
    "https://idodata.com/wp-content/uploads/2024/02/MASArticle-scaled.jpg";

/// Load a `.env` file into the process environment.
///
/// With no explicit path the usual `.env` lookup is used and a missing file is
/// ignored. An explicitly given file must exist. Returns the file that was loaded.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(loaded) => Ok(Some(loaded)),
            Err(err) if err.not_found() => {
                debug!("No .env file found, using process environment only");
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to load .env file"),
        },
    }
}

/// Credentials and endpoints for the two remote services.
#[derive(Clone)]
pub struct Settings {
    pub azure_key: String,
    pub azure_endpoint: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self, ReviewError> {
        Self::from_map(&std::env::vars().collect())
    }

    /// Build settings from a provided map (useful for testing).
    pub fn from_map(env: &HashMap<String, String>) -> Result<Self, ReviewError> {
        let settings = Self {
            azure_key: required(env, AZURE_KEY)?,
            azure_endpoint: required(env, AZURE_ENDPOINT)?,
            openai_api_key: required(env, OPENAI_API_KEY)?,
            openai_base_url: optional(env, OPENAI_BASE_URL)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: optional(env, OPENAI_MODEL)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ReviewError> {
        for (name, url) in [
            (AZURE_ENDPOINT, &self.azure_endpoint),
            (OPENAI_BASE_URL, &self.openai_base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ReviewError::Config(format!(
                    "{name} must be an http(s) URL, got \"{url}\""
                )));
            }
        }
        Ok(())
    }

    /// Snapshot with credentials masked, safe to log.
    pub fn redacted(&self) -> serde_json::Value {
        redact(&json!({
            "azure_key": self.azure_key,
            "azure_endpoint": self.azure_endpoint,
            "openai_api_key": self.openai_api_key,
            "openai_base_url": self.openai_base_url,
            "openai_model": self.openai_model,
        }))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("azure_key", &mask_secret(&self.azure_key))
            .field("azure_endpoint", &self.azure_endpoint)
            .field("openai_api_key", &mask_secret(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .finish()
    }
}

fn required(env: &HashMap<String, String>, name: &str) -> Result<String, ReviewError> {
    optional(env, name)
        .ok_or_else(|| ReviewError::Config(format!("missing environment variable {name}")))
}

fn optional(env: &HashMap<String, String>, name: &str) -> Option<String> {
    env.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
