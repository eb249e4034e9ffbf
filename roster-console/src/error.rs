use roster_model::ModelError;
use thiserror::Error;

use crate::infra::api_client::ApiError;

/// Console-level failure taxonomy.
///
/// Every failure that crosses an operation boundary is one of these; the
/// message is what the operator sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Session missing or rejected; the caller must go to the login page.
    #[error("login required")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Transient(String),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized)
    }

    /// Classify a failed identity request. A 401 or 403 here means the
    /// session itself was rejected.
    pub fn from_identity_failure(err: ApiError) -> Self {
        match err.status() {
            Some(401 | 403) => ConsoleError::Unauthorized,
            _ => ConsoleError::from(err),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConsoleError::Unauthorized => "unauthorized",
            ConsoleError::NotFound(_) => "not-found",
            ConsoleError::Validation(_) => "validation",
            ConsoleError::Conflict(_) => "conflict",
            ConsoleError::Transient(_) => "transient",
        }
    }
}

impl From<ApiError> for ConsoleError {
    fn from(err: ApiError) -> Self {
        if let ApiError::Redirect { .. } = err {
            return ConsoleError::Unauthorized;
        }

        let message = err
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());

        // Outside the identity load a 401/403 is a rejected request, not a
        // lost session.
        match err.status() {
            Some(400 | 401 | 403 | 422) => ConsoleError::Validation(message),
            Some(404) => ConsoleError::NotFound(message),
            Some(409) => ConsoleError::Conflict(message),
            _ => ConsoleError::Transient(message),
        }
    }
}

impl From<ModelError> for ConsoleError {
    fn from(err: ModelError) -> Self {
        ConsoleError::Validation(err.to_string())
    }
}
