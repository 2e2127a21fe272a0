//! Avatar download into session-lifetime object URLs.
//!
//! DESIGN
//! ======
//! Downloaded bytes are kept in an in-process registry and handed out as
//! opaque `blob:postwall/<uuid>` URLs, the same role a browser object URL
//! plays. A URL stays valid until revoked; holders must revoke the URL they
//! replace, otherwise the bytes stay resident for the life of the registry.
//!
//! ERROR HANDLING
//! ==============
//! Resolution never fails loudly: any download problem is logged and the
//! empty string is returned, meaning "no picture available".

#[cfg(test)]
#[path = "pictures_test.rs"]
mod pictures_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::net::{Backend, BackendError};

pub const OBJECT_URL_PREFIX: &str = "blob:postwall/";

/// Non-fatal avatar download failure.
#[derive(Debug, thiserror::Error)]
pub enum PictureError {
    #[error("picture download failed for {name}: {source}")]
    Download {
        name: String,
        #[source]
        source: BackendError,
    },
    #[error("picture {name} is empty")]
    Empty { name: String },
}

// =============================================================================
// OBJECT URL REGISTRY
// =============================================================================

/// Registry of downloaded objects addressable by local URL.
#[derive(Clone, Default)]
pub struct ObjectUrls {
    inner: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,
}

impl ObjectUrls {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return a fresh URL for them.
    pub fn create(&self, bytes: Vec<u8>) -> String {
        let url = format!("{OBJECT_URL_PREFIX}{}", Uuid::new_v4());
        self.lock().insert(url.clone(), bytes.into());
        url
    }

    /// Bytes behind `url`, if it is still live.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().get(url).cloned()
    }

    /// Release `url`. Returns `false` if it was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    /// Number of live URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Turns storage object names into local object URLs.
#[derive(Clone)]
pub struct PictureResolver {
    backend: Arc<dyn Backend>,
    urls: ObjectUrls,
}

impl PictureResolver {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, urls: ObjectUrls) -> Self {
        Self { backend, urls }
    }

    #[must_use]
    pub fn urls(&self) -> &ObjectUrls {
        &self.urls
    }

    /// Download `name` and register it. Returns `""` on any failure.
    pub async fn resolve(&self, name: &str) -> String {
        match self.try_resolve(name).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "profile picture unavailable");
                String::new()
            }
        }
    }

    /// Download `name` and register it, surfacing the failure reason.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError`] if the download fails or yields no bytes.
    pub async fn try_resolve(&self, name: &str) -> Result<String, PictureError> {
        let bytes = self
            .backend
            .download_file(name)
            .await
            .map_err(|source| PictureError::Download { name: name.to_owned(), source })?;
        if bytes.is_empty() {
            return Err(PictureError::Empty { name: name.to_owned() });
        }
        Ok(self.urls.create(bytes))
    }

    /// Release a URL previously returned by [`Self::resolve`]. Empty and
    /// foreign strings are ignored.
    pub fn release(&self, url: &str) {
        if url.starts_with(OBJECT_URL_PREFIX) {
            self.urls.revoke(url);
        }
    }
}
