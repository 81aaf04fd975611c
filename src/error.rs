use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("AI service unavailable: {0}")]
    Upstream(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StudioError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// HTTP-style status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Serialization(_) => 400,
            Self::NotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Errors raised by an AI collaborator. These are always turned into a
    /// local fallback and never reach the caller.
    pub fn is_upstream(&self) -> bool {
        match self {
            Self::Upstream(_) => true,
            #[cfg(feature = "gemini")]
            Self::Http(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
