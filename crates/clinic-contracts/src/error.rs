//! Error types for the clinic data layer.
//!
//! Constructors and loaders return `ClinicResult<T>`. Terminal query
//! operations never return `Err`; they fold a `ClinicError` into the
//! envelope's `ErrorBody` so callers see one uniform response shape.

use thiserror::Error;

/// Message carried by every "no matching row" failure.
pub const NOT_FOUND_MESSAGE: &str = "Item não encontrado";

/// Message returned when sign-in cannot find the identifier.
pub const USER_NOT_FOUND_MESSAGE: &str = "Usuário não encontrado";

/// Message returned when sign-in finds the user but the password is wrong.
pub const INCORRECT_PASSWORD_MESSAGE: &str = "Senha incorreta";

/// The unified error type for the clinic crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClinicError {
    /// An update or delete matched no row.
    #[error("Item não encontrado")]
    NotFound,

    /// A table name did not resolve to a known collection.
    #[error("unknown table '{name}'")]
    UnknownTable { name: String },

    /// A payload did not fit the table's record shape.
    #[error("invalid {table} record: {reason}")]
    InvalidRecord { table: String, reason: String },

    /// An insert supplied an id that already exists in the table.
    #[error("duplicate id '{id}' in table '{table}'")]
    DuplicateId { table: String, id: String },

    /// Sign-in or password update could not find the user.
    #[error("Usuário não encontrado")]
    UserNotFound,

    /// Sign-in found the user but the password did not match.
    #[error("Senha incorreta")]
    IncorrectPassword,

    /// A new password failed the strength rules.
    #[error("weak password: {}", reasons.join("; "))]
    WeakPassword { reasons: Vec<String> },

    /// The access policy denied the operation.
    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The durable pending-user store could not be read or written.
    #[error("storage error: {reason}")]
    StorageError { reason: String },

    /// Anything else, including a poisoned store lock.
    #[error("Erro interno do servidor: {reason}")]
    Internal { reason: String },
}

/// Convenience alias used throughout the clinic crates.
pub type ClinicResult<T> = Result<T, ClinicError>;
