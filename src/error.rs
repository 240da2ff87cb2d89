//! Error types for cluster-testdata.

use thiserror::Error;

/// Errors that can occur while seeding test data.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Configuration file missing, malformed, or lacking required keys.
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// Database unreachable or credentials rejected.
    #[error("Database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Statement failure while the seeding transaction was open.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The seeding transaction was already committed or rolled back.
    #[error("Database transaction already finished")]
    TransactionClosed,

    /// No hosted zone matches the configured domain.
    #[error("[Route53] Could not find hosted zone associated with domain {0}")]
    ZoneNotFound(String),

    /// Route53 API call or request construction failed.
    #[error("Route53 error: {0}")]
    Dns(String),

    /// DNS name for a record set is not valid.
    #[error("Invalid DNS name {name}: {source}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Parser error.
        #[source]
        source: hickory_proto::ProtoError,
    },

    /// Word list has no usable lines.
    #[error("Name list {0} contains no names")]
    NameList(String),

    /// IO error (word list, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SeedError>;
