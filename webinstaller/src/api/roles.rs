// Roles API actions

use log::{error, info};

use crate::database::registry::ConnectionRegistry;
use crate::models::responses::ApiResponse;
use crate::models::role::{Role, RolesTable};

pub const ROLES_INDEX_ACTION: &str = "roles.index";
pub const ROLES_INDEX_URL: &str = "/roles.json";
pub const ROLES_INDEX_FAILED: &str = "The roles could not be retrieved.";

/// List all roles.
pub async fn roles_index(registry: &mut ConnectionRegistry) -> ApiResponse<Vec<Role>> {
    match RolesTable::find_all(registry).await {
        Ok(roles) => {
            info!(
                "[PHASE: api] [STEP: roles_index] Returning {} roles",
                roles.len()
            );
            ApiResponse::success(
                ROLES_INDEX_ACTION,
                ROLES_INDEX_URL,
                "The operation was successful.",
                roles,
            )
        }
        Err(e) => {
            error!("[PHASE: api] [STEP: roles_index] Failed to list roles: {}", e);
            ApiResponse::error(ROLES_INDEX_ACTION, ROLES_INDEX_URL, 500, ROLES_INDEX_FAILED)
        }
    }
}
