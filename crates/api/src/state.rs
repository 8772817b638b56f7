use std::sync::Arc;

use opsboard_core::cache::ResultCache;

use crate::attachments::AttachmentStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: opsboard_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Listing cache shared by all handlers.
    pub cache: ResultCache,
    /// Invoice attachment storage.
    pub attachments: Arc<AttachmentStore>,
}

impl AppState {
    pub fn new(pool: opsboard_db::DbPool, config: ServerConfig) -> Self {
        let cache = ResultCache::in_memory(std::time::Duration::from_secs(config.cache_ttl_secs));
        let attachments = Arc::new(AttachmentStore::new(config.upload_dir.clone()));
        Self {
            pool,
            config: Arc::new(config),
            cache,
            attachments,
        }
    }
}
