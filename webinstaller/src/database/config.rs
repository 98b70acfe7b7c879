// Connection configuration builder
// Turns installer form fields into a complete connection configuration.

use log::debug;

use crate::database::driver::{resolve_driver, DriverId};
use crate::error::Result;
use crate::models::requests::ConnectionFields;
use crate::utils::logging::mask_sensitive;

/// Environment variable consulted when neither `driver` nor `dbType` is given.
pub const DB_TYPE_ENV: &str = "DB_TYPE";
pub const DEFAULT_DB_TYPE: &str = "mysql";

pub const ENCODING: &str = "utf8";
pub const TIMEZONE: &str = "UTC";

/// Complete configuration for one connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub driver: DriverId,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub encoding: String,
    pub timezone: String,
    pub persistent: bool,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("encoding", &self.encoding)
            .field("timezone", &self.timezone)
            .field("persistent", &self.persistent)
            .finish()
    }
}

impl ConnectionConfig {
    /// Log-safe one-line description (no password, masked user).
    pub fn describe(&self) -> String {
        format!(
            "driver={} host={} port={} user={} database={}",
            self.driver,
            self.host,
            self.port,
            mask_sensitive(&self.username),
            self.database
        )
    }
}

/// Build a connection configuration from form fields.
///
/// An explicit `driver` wins outright. Otherwise `db_type`, or `fallback_db_type`
/// when absent, goes through the driver resolver.
pub fn build_config(fields: &ConnectionFields, fallback_db_type: &str) -> Result<ConnectionConfig> {
    let driver = match &fields.driver {
        Some(explicit) => DriverId::from_override(explicit),
        None => resolve_driver(fields.db_type.as_deref().unwrap_or(fallback_db_type))?,
    };

    let config = ConnectionConfig {
        driver,
        host: fields.host.clone(),
        port: fields.port,
        username: fields.username.clone(),
        password: fields.password.clone(),
        database: fields.database.clone(),
        encoding: ENCODING.to_string(),
        timezone: TIMEZONE.to_string(),
        persistent: false,
    };

    debug!(
        "[PHASE: database] [STEP: build_config] Built connection config ({})",
        config.describe()
    );
    Ok(config)
}

/// The fallback database type from `DB_TYPE`, or "mysql".
pub fn env_db_type() -> String {
    std::env::var(DB_TYPE_ENV).unwrap_or_else(|_| DEFAULT_DB_TYPE.to_string())
}

/// [`build_config`] with the fallback read from the process environment.
pub fn build_config_from_env(fields: &ConnectionFields) -> Result<ConnectionConfig> {
    build_config(fields, &env_db_type())
}
