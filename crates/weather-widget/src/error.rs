use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    User,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
        }
    }
}

/// Only an unknown place is the user's fault; every other provider failure
/// is a runtime error.
impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        if error.is_not_found() {
            Self::user(error.to_string())
        } else {
            Self::runtime(error.to_string())
        }
    }
}
