// Database driver resolution
// Maps the installer form's symbolic database type onto a driver identifier.

use std::fmt;
use std::str::FromStr;

use crate::error::{InstallerError, Result};

/// Database types the installer can configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    Mysql,
    Postgres,
}

impl DatabaseType {
    /// Symbolic name as submitted by the installer form
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Mysql => "mysql",
            DatabaseType::Postgres => "postgres",
        }
    }

    pub fn driver_id(&self) -> DriverId {
        match self {
            DatabaseType::Mysql => DriverId::Mysql,
            DatabaseType::Postgres => DriverId::Postgres,
        }
    }
}

impl FromStr for DatabaseType {
    type Err = InstallerError;

    /// Case-sensitive, matching what the form posts.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mysql" => Ok(DatabaseType::Mysql),
            "postgres" => Ok(DatabaseType::Postgres),
            other => Err(InstallerError::UnsupportedDriver(other.to_string())),
        }
    }
}

/// Identifier of the client implementation a connection uses.
///
/// `Other` only appears when a caller overrides the driver explicitly with a
/// name this crate has no client for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DriverId {
    Mysql,
    Postgres,
    Other(String),
}

impl DriverId {
    pub const MYSQL: &'static str = "sqlx::mysql";
    pub const POSTGRES: &'static str = "sqlx::postgres";

    /// Parse an explicit driver override. Never fails: unknown names are kept verbatim.
    pub fn from_override(raw: &str) -> Self {
        match raw {
            Self::MYSQL => DriverId::Mysql,
            Self::POSTGRES => DriverId::Postgres,
            other => DriverId::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DriverId::Mysql => Self::MYSQL,
            DriverId::Postgres => Self::POSTGRES,
            DriverId::Other(name) => name,
        }
    }

    /// The database type this driver speaks, if it is one we ship a client for.
    pub fn database_type(&self) -> Option<DatabaseType> {
        match self {
            DriverId::Mysql => Some(DatabaseType::Mysql),
            DriverId::Postgres => Some(DatabaseType::Postgres),
            DriverId::Other(_) => None,
        }
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a symbolic database type ("mysql" or "postgres") to its driver.
pub fn resolve_driver(db_type: &str) -> Result<DriverId> {
    db_type.parse::<DatabaseType>().map(|t| t.driver_id())
}
