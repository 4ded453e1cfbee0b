// Error types shared across the crate
//
// CatalogError never leaves the youtube module: the catalog logs it and
// degrades to an empty list. BackendError is propagated to callers, and only
// the Auth variant is meant to be shown to the user as-is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("YouTube API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse YouTube response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    // PostgREST style failure, code is the Postgres/PostgREST error code
    #[error("backend returned {status}{}: {message}", code_suffix(.code))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Auth(String),

    #[error("you need to log in first")]
    NotSignedIn,

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("could not parse backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("saved session: {0}")]
    Credential(#[from] std::io::Error),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl BackendError {
    // Errors the login form should print verbatim
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            BackendError::Auth(_) | BackendError::NotSignedIn | BackendError::InvalidInput(_)
        )
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
