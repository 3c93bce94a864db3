//! Shared application state handed to every handler.

use std::sync::{Arc, Mutex};

use artcafe_store::Database;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::image_store::ImageStore;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub images: Arc<ImageStore>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

/// The single SQLite connection, shared across requests.
///
/// `rusqlite` is blocking, so every access goes through [`Db::call`], which
/// takes the lock on the blocking thread pool. Store work is therefore
/// serialized; a handler that needs a check followed by a write does both
/// inside one closure.
#[derive(Clone)]
pub struct Db(Arc<Mutex<Database>>);

impl Db {
    pub fn new(db: Database) -> Self {
        Self(Arc::new(Mutex::new(db)))
    }

    pub async fn call<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Database) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.0.clone();
        tokio::task::spawn_blocking(move || {
            let mut db = inner
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
            f(&mut db)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("database task failed: {e}")))?
    }
}
