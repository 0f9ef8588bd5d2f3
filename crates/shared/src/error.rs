use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::BackendAction;

/// An `{ok: false, error}` envelope returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("backend rejected {action}: {message}")]
pub struct BackendError {
    pub action: BackendAction,
    pub message: String,
}

impl BackendError {
    pub fn new(action: BackendAction, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
        }
    }

    /// Uses the backend's own text when it sent one.
    pub fn from_envelope(action: BackendAction, error: Option<String>, fallback: &str) -> Self {
        let message = error
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self::new(action, message)
    }
}
