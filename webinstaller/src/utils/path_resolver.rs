use anyhow::Result;
use std::path::{Path, PathBuf};

const LOG_FOLDER_NAME: &str = "webinstaller";

/// Resolve log folder (absolute path)
///
/// An explicit folder wins. Otherwise the per-user data dir, falling back to
/// `./logs` when the platform has none.
pub fn resolve_log_folder(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(p) => p.to_path_buf(),
        None => match dirs::data_local_dir() {
            Some(base) => base.join(LOG_FOLDER_NAME).join("logs"),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("logs"),
        },
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder {:?}: {}", dir, e))?;
    Ok(dir)
}
