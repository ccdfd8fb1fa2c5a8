use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Agent not initialized: {0}")]
    Uninitialized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution error in {tool}: {detail}")]
    Execution { tool: String, detail: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn execution(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Execution {
            tool: tool.into(),
            detail: detail.into(),
        }
    }

    /// Short machine-readable name of the error kind, used by the transport layer.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Uninitialized(_) => "uninitialized",
            Error::NotFound(_) => "not_found",
            Error::Execution { .. } => "execution",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Http(_) => "http",
            Error::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
