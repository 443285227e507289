use std::path::PathBuf;

/// Errors surfaced by the cookie subsystem.
///
/// Only persistence and import failures are ever returned to callers. Malformed
/// headers and URLs are handled locally by the interceptor.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::CookieConfigError),
}

impl CookieError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CookieError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a single `Set-Cookie` line could not be turned into a cookie.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetCookieError {
    #[error("Empty Set-Cookie header")]
    Empty,

    #[error("Missing name=value pair")]
    MissingNameValue,

    #[error("Cookie name is empty")]
    EmptyName,
}
