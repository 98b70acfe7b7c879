// Expected schema source
// The set of tables an application schema version requires.

use crate::error::{InstallerError, Result};

/// Source of truth for the tables a schema version must contain.
pub trait SchemaTables: Send + Sync {
    fn schema_tables(&self, version: u32) -> Result<Vec<String>>;
}

/// Schema version checked by the installer database step.
pub const INSTALLER_SCHEMA_VERSION: u32 = 1;

const SCHEMA_V1_TABLES: &[&str] = &[
    "account_settings",
    "action_logs",
    "actions",
    "authentication_tokens",
    "avatars",
    "comments",
    "email_queue",
    "entities_history",
    "favorites",
    "gpgkeys",
    "groups",
    "groups_users",
    "organization_settings",
    "permissions",
    "permissions_history",
    "phinxlog",
    "profiles",
    "resource_types",
    "resources",
    "roles",
    "secret_accesses",
    "secrets",
    "secrets_history",
    "user_agents",
    "users",
];

/// Built-in health checks of the application.
#[derive(Debug, Default, Clone, Copy)]
pub struct Healthchecks;

impl SchemaTables for Healthchecks {
    fn schema_tables(&self, version: u32) -> Result<Vec<String>> {
        match version {
            1 => Ok(SCHEMA_V1_TABLES.iter().map(|t| t.to_string()).collect()),
            other => Err(InstallerError::UnsupportedSchemaVersion(other)),
        }
    }
}
