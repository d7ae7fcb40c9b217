//! Error types for pgwrap

use std::path::PathBuf;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type alias for pgwrap operations
pub type WrapResult<T> = Result<T, WrapError>;

/// Error types for configuration, statement building and execution
#[derive(Debug, Error)]
pub enum WrapError {
    /// Configuration file does not exist
    #[error("Configuration not found: {}", .0.display())]
    ConfigurationNotFound(PathBuf),

    /// Configuration is not valid JSON or misses required keys
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// Connection settings rejected by the driver
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool checkout or build error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Driver error, passed through unmodified
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// INSERT field registered both as a constant and as a bound parameter
    #[error("There are repeated keys in constants and values: {0}")]
    DuplicateField(String),

    /// UPDATE rendered without any SET assignment
    #[error("UPDATE {0} has no SET assignments")]
    EmptyUpdate(String),

    /// A `%(name)s` placeholder has no value in the parameter mapping
    #[error("No value bound for placeholder %({0})s")]
    MissingParameter(String),

    /// Row lookup by an unknown column name
    #[error("{0} is not a valid column")]
    NoSuchColumn(String),

    /// Column value could not be decoded
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A builder was executed without a session
    #[error("Statement builder is not bound to a session")]
    Unbound,

    /// Query file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl WrapError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(message.into())
    }

    /// SQLSTATE reported by the server, if this is a database error
    pub fn sql_state(&self) -> Option<&SqlState> {
        match self {
            Self::Query(err) => err.code(),
            _ => None,
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        self.sql_state() == Some(&SqlState::UNIQUE_VIOLATION)
    }

    /// Check if this is a missing configuration file error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigurationNotFound(_))
    }
}

impl From<deadpool_postgres::PoolError> for WrapError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
