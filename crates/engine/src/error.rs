//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a request field is malformed or out of range.
//! - [`KeyNotFound`] thrown when an item is not found for the requesting owner.
//! - [`Unavailable`] thrown when the store is not configured or unreachable.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Unavailable`]: EngineError::Unavailable
use sea_orm::DbErr;
use thiserror::Error;

/// First failing field of a request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("Database unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Corrupted row: {0}")]
    CorruptedRow(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        match value {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Unavailable(value.to_string()),
            other => Self::Database(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::InvalidConfig(a), Self::InvalidConfig(b)) => a == b,
            (Self::CorruptedRow(a), Self::CorruptedRow(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
