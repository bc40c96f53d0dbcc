//! The module contains the errors the engine can throw.
//!
//! The errors fall in four classes:
//!
//! - validation: [`Validation`], [`InvalidAmount`], [`CurrencyMismatch`] and
//!   [`InvalidCursor`], raised before anything is persisted.
//! - lookup: [`KeyNotFound`] and [`ExistingKey`].
//! - [`DependencyWriteFailure`]: a write coupled to another one (loan
//!   origination, reconciliation) failed and the whole unit was rolled back.
//! - [`Database`]: anything else coming from the storage layer.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`CurrencyMismatch`]: EngineError::CurrencyMismatch
//!  [`InvalidCursor`]: EngineError::InvalidCursor
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`DependencyWriteFailure`]: EngineError::DependencyWriteFailure
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Dependent write failed: {0}")]
    DependencyWriteFailure(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Name of the offending field, for field-level validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    /// Reclassifies a storage failure of a coupled write.
    ///
    /// Only [`EngineError::Database`] is rewritten: lookup and validation
    /// errors keep their meaning for the caller.
    pub(crate) fn into_dependency_failure(self, context: &str) -> Self {
        match self {
            Self::Database(err) => Self::DependencyWriteFailure(format!("{context}: {err}")),
            other => other,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Validation {
                    field: fa,
                    message: ma,
                },
                Self::Validation {
                    field: fb,
                    message: mb,
                },
            ) => fa == fb && ma == mb,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::DependencyWriteFailure(a), Self::DependencyWriteFailure(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
