// Schema verification
// Checks that every table the application expects exists in the default database.

use log::{info, warn};

use crate::database::healthchecks::{SchemaTables, INSTALLER_SCHEMA_VERSION};
use crate::database::registry::{ConnectionRegistry, DEFAULT_CONNECTION};
use crate::error::{InstallerError, Result};

/// Fail on the first expected table absent from `live`.
///
/// Iterates `expected` in order and stops at the first gap; extra live tables
/// are ignored. The error does not name the missing table.
pub fn check_tables(live: &[String], expected: &[String]) -> Result<()> {
    for table in expected {
        if !live.contains(table) {
            warn!(
                "[PHASE: database] [STEP: validate_schema] Expected table missing: {}",
                table
            );
            return Err(InstallerError::SchemaMismatch);
        }
    }
    Ok(())
}

/// Validate the default connection's tables against schema version 1.
pub async fn validate_schema(
    registry: &mut ConnectionRegistry,
    schema_tables: &dyn SchemaTables,
) -> Result<()> {
    let connection = registry.get(DEFAULT_CONNECTION)?;
    let live = connection.list_tables().await?;
    let expected = schema_tables.schema_tables(INSTALLER_SCHEMA_VERSION)?;

    info!(
        "[PHASE: database] [STEP: validate_schema] Checking {} expected tables against {} live tables",
        expected.len(),
        live.len()
    );
    check_tables(&live, &expected)?;

    info!("[PHASE: database] [STEP: validate_schema] Schema validation passed");
    Ok(())
}
