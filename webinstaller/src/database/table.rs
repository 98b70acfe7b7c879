// Table metadata and table locator
// Entity shapes are declared statically; the locator binds them to a backing
// connection and caches the result until the connection is replaced.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{InstallerError, Result};

/// One mapped row, keyed by column name.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Stored as CHAR(36) on MySQL and native `uuid` on PostgreSQL
    Uuid,
    /// Naive UTC timestamp, rendered as RFC 3339
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Static description of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [Column],
}

/// A table bound to the connection it is read through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub alias: String,
    pub schema: TableSchema,
    pub connection: String,
}

impl Table {
    pub fn name(&self) -> &'static str {
        self.schema.table
    }

    pub fn columns(&self) -> &'static [Column] {
        self.schema.columns
    }
}

/// Cache of [`Table`] instances by alias.
#[derive(Debug, Default)]
pub struct TableLocator {
    schemas: HashMap<String, TableSchema>,
    tables: HashMap<String, Arc<Table>>,
}

impl TableLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entity table under an alias (e.g. "Roles").
    pub fn register(&mut self, alias: &str, schema: TableSchema) {
        self.schemas.insert(alias.to_string(), schema);
    }

    /// Return the cached table for `alias`, building it against `connection` on first use.
    pub fn fetch(&mut self, alias: &str, connection: &str) -> Result<Arc<Table>> {
        if let Some(table) = self.tables.get(alias) {
            return Ok(Arc::clone(table));
        }

        let schema = self
            .schemas
            .get(alias)
            .copied()
            .ok_or_else(|| InstallerError::UnknownTable(alias.to_string()))?;

        let table = Arc::new(Table {
            alias: alias.to_string(),
            schema,
            connection: connection.to_string(),
        });
        self.tables.insert(alias.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Drop every cached table instance. Declarations are kept.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn cached(&self) -> usize {
        self.tables.len()
    }
}
