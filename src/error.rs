use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KindlingError>;

#[derive(Debug, Error)]
pub enum KindlingError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("HTTP verb '{verb}' is not supported by the router (route {path})")]
    UnsupportedVerb { verb: String, path: String },

    #[error("Scan package not found: {name}")]
    PackageNotFound { name: String },

    #[error("Unable to locate entry source file: {file}")]
    EntryLocationUnknown { file: String },

    #[error("Invalid application state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KindlingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl axum::response::IntoResponse for KindlingError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            KindlingError::Internal(msg) => msg.clone(),
            _ => self.to_string(),
        };
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
