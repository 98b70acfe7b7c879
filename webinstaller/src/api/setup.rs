// Installer database step
// Apply the submitted connection fields, test the connection and, when asked,
// check the schema of an existing database.

use log::{error, info, warn};

use crate::database::healthchecks::SchemaTables;
use crate::database::prober::{probe, ProbeOutcome};
use crate::database::registry::ConnectionRegistry;
use crate::database::schema_verifier::validate_schema;
use crate::error::InstallerError;
use crate::models::requests::ConnectionFields;
use crate::models::responses::{ApiResponse, DatabaseCheckResponse};

pub const DATABASE_ACTION: &str = "install.database";
pub const DATABASE_URL: &str = "/install/database.json";
pub const SCHEMA_CHECK_FAILED: &str = "The database schema could not be checked.";

/// Run the database step of the installer.
///
/// Caller errors (unknown database type) and schema mismatches come back as
/// error envelopes. An unreachable server is a successful response with
/// `connected: false` so the form can be corrected and resubmitted.
pub async fn check_database(
    registry: &mut ConnectionRegistry,
    fields: &ConnectionFields,
    fallback_db_type: &str,
    schema_tables: Option<&dyn SchemaTables>,
) -> ApiResponse<DatabaseCheckResponse> {
    info!(
        "[PHASE: setup] [STEP: database] Database step requested (host={}, database={})",
        fields.host, fields.database
    );

    if let Err(e) = registry.set_default_config(fields, fallback_db_type).await {
        warn!("[PHASE: setup] [STEP: database] Rejected connection fields: {}", e);
        return ApiResponse::error(DATABASE_ACTION, DATABASE_URL, 400, e.to_string());
    }

    match probe(registry).await {
        ProbeOutcome::Connected => {}
        ProbeOutcome::Unreachable(reason) | ProbeOutcome::Misconfigured(reason) => {
            return ApiResponse::success(
                DATABASE_ACTION,
                DATABASE_URL,
                "A connection could not be established with the credentials provided.",
                DatabaseCheckResponse {
                    connected: false,
                    reason: Some(reason),
                    schema_valid: None,
                },
            );
        }
    }

    let schema_valid = match schema_tables {
        None => None,
        Some(tables) => match validate_schema(registry, tables).await {
            Ok(()) => Some(true),
            Err(InstallerError::SchemaMismatch) => {
                return ApiResponse::error(
                    DATABASE_ACTION,
                    DATABASE_URL,
                    400,
                    InstallerError::SchemaMismatch.to_string(),
                );
            }
            Err(e) => {
                error!("[PHASE: setup] [STEP: database] Schema check failed: {}", e);
                return ApiResponse::error(DATABASE_ACTION, DATABASE_URL, 500, SCHEMA_CHECK_FAILED);
            }
        },
    };

    ApiResponse::success(
        DATABASE_ACTION,
        DATABASE_URL,
        "The connection to the database was successful.",
        DatabaseCheckResponse {
            connected: true,
            reason: None,
            schema_valid,
        },
    )
}
