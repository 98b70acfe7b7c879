// Installer error types
// Caller input errors and schema errors surface to the installer UI; connectivity
// failures are absorbed by the prober and never reach this type.

use thiserror::Error;

/// Errors surfaced by the database setup step and the roles listing.
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("Invalid database type: {0}")]
    UnsupportedDriver(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("The datasource configuration \"{0}\" was not found")]
    MissingConnection(String),

    #[error("The datasource configuration \"{0}\" already exists")]
    ConfigExists(String),

    #[error("Database driver {0} cannot be used")]
    MissingDriver(String),

    #[error("The database schema does not match the one expected")]
    SchemaMismatch,

    #[error("Unknown schema version: {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("Unknown table alias: {0}")]
    UnknownTable(String),

    #[error("Record mapping failed: {0}")]
    Mapping(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, InstallerError>;
