use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;

use crate::auth::Keys;
use crate::config::Config;
use crate::media::{DiskMediaStore, MediaStore};
use crate::store::Store;

/// Everything a request handler can reach. Cheap to clone, handed out through an `Extension`.
#[derive(Clone)]
pub struct State {
    store: Arc<RwLock<Store>>,
    pub keys: Arc<Keys>,
    pub media: Arc<dyn MediaStore>,
    pub config: Arc<Config>,
}

impl State {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let media = DiskMediaStore::new(&config.uploads_dir, config.max_upload_bytes)
            .await
            .with_context(|| format!("Error creating uploads directory {}", config.uploads_dir.display()))?;
        Ok(Self::with_media(config, Arc::new(media)))
    }

    pub fn with_media(config: Config, media: Arc<dyn MediaStore>) -> Self {
        Self {
            store: Default::default(),
            keys: Arc::new(Keys::new(config.jwt_secret.as_bytes(), config.token_ttl_hours)),
            media,
            config: Arc::new(config),
        }
    }

    /// Runs `func` against the store while holding the shared lock.
    pub async fn read<T>(&self, func: impl FnOnce(&Store) -> T) -> T {
        let store = self.store.read().await;
        func(&*store)
    }

    /// Runs `func` against the store while holding the exclusive lock, nothing else observes
    /// the store until it returns.
    pub async fn write<T>(&self, func: impl FnOnce(&mut Store) -> T) -> T {
        let mut store = self.store.write().await;
        func(&mut *store)
    }
}
