// Role entity and its table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::registry::ConnectionRegistry;
use crate::database::table::{Column, ColumnKind, TableSchema};
use crate::error::{InstallerError, Result};

pub const ROLES_ALIAS: &str = "Roles";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// The `roles` table.
pub struct RolesTable;

impl RolesTable {
    pub const SCHEMA: TableSchema = TableSchema {
        table: "roles",
        columns: &[
            Column {
                name: "id",
                kind: ColumnKind::Uuid,
            },
            Column {
                name: "name",
                kind: ColumnKind::Text,
            },
            Column {
                name: "description",
                kind: ColumnKind::Text,
            },
            Column {
                name: "created",
                kind: ColumnKind::DateTime,
            },
            Column {
                name: "modified",
                kind: ColumnKind::DateTime,
            },
        ],
    };

    /// All roles, read through the default connection.
    pub async fn find_all(registry: &mut ConnectionRegistry) -> Result<Vec<Role>> {
        let table = registry.table(ROLES_ALIAS)?;
        let connection = registry.get(&table.connection)?;

        connection
            .fetch_all(&table)
            .await?
            .into_iter()
            .map(|record| {
                serde_json::from_value(Value::Object(record))
                    .map_err(|e| InstallerError::Mapping(format!("roles: {}", e)))
            })
            .collect()
    }
}
