use rating_sync_config::{Config, PathManager, StoreBackend};
use std::sync::Arc;
use tracing::info;

use crate::error::StoreError;
use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::traits::RecordStore;

/// Construct the configured backend. Exactly one store is ever active, so
/// this is a plain constructor rather than a registry.
pub fn create_store(config: &Config) -> Result<Arc<dyn RecordStore>, StoreError> {
    match config.backend {
        StoreBackend::Remote => {
            let remote = config.remote.as_ref().ok_or_else(|| {
                StoreError::Config("backend is 'remote' but [remote] is not configured".to_string())
            })?;
            info!(backend = "remote", url = %remote.url, "Selected record store backend");
            Ok(Arc::new(RemoteStore::new(remote)))
        }
        StoreBackend::Local => {
            let path = config
                .local
                .as_ref()
                .and_then(|local| local.path.clone())
                .unwrap_or_else(|| PathManager::default().ratings_file());
            info!(backend = "local", path = %path.display(), "Selected record store backend");
            Ok(Arc::new(LocalStore::new(path)))
        }
    }
}
