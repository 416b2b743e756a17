//! Unified application error model and mapping helpers.
//! Every caller-visible rejection in aula is one of these variants; each maps
//! to a stable snake_case code and a single HTTP status. No error here is
//! fatal to the process.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    InvalidInput { message: String },
    DuplicateAccount { message: String },
    InvalidCredentials { message: String },
    Unauthenticated { message: String },
    Forbidden { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "invalid_input",
            AppError::DuplicateAccount { .. } => "duplicate_account",
            AppError::InvalidCredentials { .. } => "invalid_credentials",
            AppError::Unauthenticated { .. } => "unauthenticated",
            AppError::Forbidden { .. } => "forbidden",
            AppError::NotFound { .. } => "not_found",
            AppError::Internal { .. } => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidInput { message }
            | AppError::DuplicateAccount { message }
            | AppError::InvalidCredentials { message }
            | AppError::Unauthenticated { message }
            | AppError::Forbidden { message }
            | AppError::NotFound { message }
            | AppError::Internal { message } => message.as_str(),
        }
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self { AppError::InvalidInput { message: msg.into() } }
    pub fn duplicate<S: Into<String>>(msg: S) -> Self { AppError::DuplicateAccount { message: msg.into() } }
    pub fn forbidden<S: Into<String>>(msg: S) -> Self { AppError::Forbidden { message: msg.into() } }
    pub fn not_found<S: Into<String>>(msg: S) -> Self { AppError::NotFound { message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { AppError::Internal { message: msg.into() } }

    /// Same message for unknown email and wrong password so callers cannot
    /// probe which field was incorrect.
    pub fn invalid_credentials() -> Self {
        AppError::InvalidCredentials { message: "invalid credentials".into() }
    }

    pub fn unauthenticated() -> Self {
        AppError::Unauthenticated { message: "unauthorized".into() }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidInput { .. } => 400,
            AppError::DuplicateAccount { .. } => 400,
            AppError::InvalidCredentials { .. } => 401,
            AppError::Unauthenticated { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { message: err.to_string() }
    }
}
