// Request models
// Field names follow the installer database form (`dbType` is camelCase there).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{InstallerError, Result};

/// Connection fields as submitted by the installer database form.
///
/// Values are trusted and passed through verbatim; only the presence of the
/// required keys and the integer port are checked at this boundary.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, alias = "dbtype", skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl std::fmt::Debug for ConnectionFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFields")
            .field("driver", &self.driver)
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionFields {
    /// Build from a flat string map (posted form data).
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            form.get(key)
                .cloned()
                .ok_or_else(|| InstallerError::MissingField(key.to_string()))
        };

        let raw_port = required("port")?;
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|e| InstallerError::InvalidField {
                field: "port".to_string(),
                reason: format!("{} ({:?})", e, raw_port),
            })?;

        Ok(ConnectionFields {
            driver: form.get("driver").cloned(),
            db_type: form.get("dbType").cloned(),
            host: required("host")?,
            port,
            username: required("username")?,
            password: required("password")?,
            database: required("database")?,
        })
    }
}
