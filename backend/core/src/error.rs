use thiserror::Error;

/// Top-level error type for the docintel pipeline.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{service} service error: {message}")]
    Service { service: String, message: String },

    #[error("reply does not match the review schema: {0}")]
    SchemaParse(String),

    #[error("OCR result contains no pages")]
    EmptyDocument,
}

impl ReviewError {
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Process exit code used when this error terminates the run. Failures
    /// outside this taxonomy exit with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Service { .. } => 3,
            Self::SchemaParse(_) => 4,
            Self::EmptyDocument => 5,
        }
    }
}
