use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    storage::LocalObjectStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub storage: LocalObjectStorage,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> Self {
        let storage = LocalObjectStorage::new(&config.storage_dir, &config.public_base_url)
            .with_max_bytes(config.max_upload_bytes);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            storage,
        }
    }
}
