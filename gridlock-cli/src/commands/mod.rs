pub mod config;
pub mod history;
pub mod leaderboard;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use gridlock_store::TursoResultStore;
use tracing::info;

use crate::config::{MEMORY_DATABASE, StorageConfig};

/// Open the result store described by the storage settings
///
/// A remote URL wins over the local database path.
pub async fn open_store(storage: &StorageConfig) -> Result<TursoResultStore> {
    if let Some(url) = &storage.remote_url {
        info!(%url, "Using remote result store");
        let token = storage.auth_token.as_deref().unwrap_or_default();
        return TursoResultStore::new_remote(url, token)
            .await
            .with_context(|| format!("Failed to connect to {}", url));
    }

    if storage.database == MEMORY_DATABASE {
        info!("Using in-memory result store; results are lost on exit");
        return Ok(TursoResultStore::new_memory().await?);
    }

    let path = Path::new(&storage.database);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!(path = %path.display(), "Using local result store");
    TursoResultStore::new_local(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))
}
