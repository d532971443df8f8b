use std::sync::Arc;

use reshub_db::services::resource_service::ResourceService;
use reshub_db::store::PgResourceStore;

use crate::config::ServerConfig;
use crate::storage::BlobUploader;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly by the lookup endpoints.
    pub pool: reshub_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Resource operations over the same pool.
    pub resources: Arc<ResourceService<PgResourceStore>>,
    /// Destination for uploaded resource files.
    pub uploader: Arc<dyn BlobUploader>,
    /// Folder passed to the uploader.
    pub upload_folder: String,
}

impl AppState {
    pub fn new(
        pool: reshub_db::DbPool,
        config: ServerConfig,
        uploader: Arc<dyn BlobUploader>,
        upload_folder: String,
    ) -> Self {
        let resources = Arc::new(ResourceService::new(PgResourceStore::new(pool.clone())));
        Self {
            pool,
            config: Arc::new(config),
            resources,
            uploader,
            upload_folder,
        }
    }
}
