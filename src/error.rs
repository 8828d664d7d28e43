//! Error types for the work hours tracker.

/// Top-level error type for the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: i64 },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Model invariant violations, checked before every write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title must be at least {min} characters long.")]
    TitleTooShort { min: usize },

    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    TitleTooLong { max: usize, actual: usize },

    #[error("End time must be after start time.")]
    EndBeforeStart,
}

/// Result type alias for the server.
pub type Result<T> = std::result::Result<T, Error>;
