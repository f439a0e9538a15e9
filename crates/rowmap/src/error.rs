//! Error types for rowmap

use thiserror::Error;

/// Result type alias for rowmap operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for mapping and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Record with the given primary key was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record does not declare a primary key column
    #[error("No primary key defined for table '{0}'; mark a column with PRIMARY_KEY")]
    NoPrimaryKey(String),

    /// The destination of a multi-row read has nothing to scan into
    #[error("No unmarshal target: {0}")]
    NoUnmarshalTarget(String),

    /// A generated key does not fit the declared integer type of the key field
    #[error("Primary key overflow on column '{column}': {value} does not fit {kind}")]
    KeyOverflow {
        column: String,
        value: i64,
        kind: &'static str,
    },

    /// A symbolic parameter in the query has no supplied value
    #[error("No such named parameter: {0}")]
    UnknownParameter(String),

    /// The record produced no columns
    #[error("Record for table '{0}' has no columns")]
    EmptyRow(String),

    /// Value decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Statement exceeded its deadline
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Statement was cancelled by the caller
    #[error("Query cancelled")]
    Cancelled,

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error
    #[cfg(feature = "postgres")]
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a primary key overflow error
    pub fn is_key_overflow(&self) -> bool {
        matches!(self, Self::KeyOverflow { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the statement was cancelled (explicitly or by deadline)
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout(_))
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
