use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// User-facing rendition of an error: what a transient notification shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::ApiError { .. } => "API_ERROR",
            AppError::ReqwestError(_) => "NETWORK_ERROR",
            AppError::ConfigError(_) | AppError::TomlError(_) => "CONFIG_ERROR",
            AppError::SerdeJsonError(_) | AppError::IoError(_) | AppError::InternalError(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Client-local errors the user can fix by editing input and retrying.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::ValidationError(_))
    }

    /// Convert into a notification and log it at the level of its category.
    pub fn notice(&self) -> Notice {
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("Session token rejected: {err}");
                "Session is invalid, please log in again".to_string()
            }
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                "Forbidden".to_string()
            }
            AppError::NotFound(msg) => {
                log::warn!("Not found: {msg}");
                msg.clone()
            }
            AppError::ApiError { status, message } => {
                log::error!("Backend rejected request ({status}): {message}");
                message.clone()
            }
            AppError::ReqwestError(err) => {
                log::error!("Network error: {err}");
                "Could not reach the server, please try again".to_string()
            }
            AppError::ConfigError(msg) => {
                log::error!("Config error: {msg}");
                msg.clone()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal error".to_string()
            }
        };

        Notice {
            code: self.code(),
            message,
        }
    }
}
