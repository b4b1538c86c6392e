use std::path::PathBuf;

use thiserror::Error;

/// Every failure the admin client can surface.
/// Remote failures are classified at the [`crate::api`] boundary; the editor
/// turns them into rollbacks plus a localized notice.
#[derive(Debug, Error)]
pub enum AdminError {
    // ── Backend errors ───────────────────────────────────────────────────────
    #[error("Backend unavailable at '{endpoint}': {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("Request to '{endpoint}' failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response from '{endpoint}'")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session expired or invalid")]
    Unauthorized,

    #[error("Not found at '{endpoint}'")]
    NotFound { endpoint: String },

    #[error("Response from '{endpoint}' carried no id")]
    MissingId { endpoint: String },

    // ── Local rejections ─────────────────────────────────────────────────────
    #[error("Id '{id}' cannot be mutated: {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("'{key}' already exists")]
    Duplicate { key: String },

    #[error("Operation '{operation}' is not supported by '{collection}'")]
    Unsupported {
        operation: &'static str,
        collection: &'static str,
    },

    #[error("Login rejected: {message}")]
    LoginRejected { message: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' needs at least {min_length} characters (actual: {actual_length})")]
    FieldTooShort {
        field_name: String,
        min_length: usize,
        actual_length: usize,
    },

    #[error("Field '{field_name}' must be a finite number")]
    NotFinite { field_name: String },

    #[error("Field '{field_name}' does not match its confirmation")]
    FieldMismatch { field_name: String },

    // ── Local I/O ────────────────────────────────────────────────────────────
    #[error("Nothing to export")]
    NothingToExport,

    #[error("I/O failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AdminError {
    pub fn unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        AdminError::Unavailable { endpoint: endpoint.into(), reason: reason.into() }
    }

    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AdminError::Transport { endpoint: endpoint.into(), source }
    }

    pub fn decode(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        AdminError::Decode { endpoint: endpoint.into(), source }
    }

    pub fn empty_field(field_name: impl Into<String>) -> Self {
        AdminError::EmptyField { field_name: field_name.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AdminError::Io { path: path.into(), source }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AdminError::Unavailable { .. } | AdminError::Transport { .. } | AdminError::Decode { .. }
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminError::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdminError::EmptyField { .. }
                | AdminError::FieldTooShort { .. }
                | AdminError::FieldMismatch { .. }
                | AdminError::NotFinite { .. }
                | AdminError::Duplicate { .. }
        )
    }
}
