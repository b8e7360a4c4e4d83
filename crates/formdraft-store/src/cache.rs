//! Typed draft cache over a durable store
//!
//! Each page owns exactly one record, stored as JSON under
//! `namespace + page path`. Distinct pages never collide and repeated visits
//! to one page converge on one key.

use crate::error::CacheError;
use crate::store::DurableStore;
use formdraft_model::{DraftRecord, PageIdentity};
use std::fmt;
use std::sync::Arc;

/// Key prefix shared by every draft record
pub const DEFAULT_NAMESPACE: &str = "autosaved_form:";

/// Typed, namespaced view of a [`DurableStore`]
#[derive(Clone)]
pub struct DraftCache {
    store: Arc<dyn DurableStore>,
    namespace: String,
}

impl DraftCache {
    /// Create cache under the default namespace
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    /// Create cache under a custom namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(store: Arc<dyn DurableStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Key prefix
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Storage key for a page
    #[inline]
    #[must_use]
    pub fn key_for(&self, page: &PageIdentity) -> String {
        format!("{}{}", self.namespace, page.path())
    }

    /// Load the page's record
    ///
    /// # Errors
    /// [`CacheError::MalformedRecord`] if the stored value does not decode,
    /// [`CacheError::Store`] if the backend read fails.
    pub fn load(&self, page: &PageIdentity) -> Result<Option<DraftRecord>, CacheError> {
        let key = self.key_for(page);
        self.load_key(&key)
    }

    /// Load the page's record, dropping it if it does not decode
    ///
    /// # Errors
    /// [`CacheError::Store`] if the backend read fails, or if a malformed
    /// record cannot be removed.
    pub fn load_or_discard(&self, page: &PageIdentity) -> Result<Option<DraftRecord>, CacheError> {
        match self.load(page) {
            Err(CacheError::MalformedRecord { key, source }) => {
                tracing::warn!("Discarding malformed draft {}: {}", key, source);
                self.store.remove(&key)?;
                Ok(None)
            }
            other => other,
        }
    }

    pub(crate) fn load_key(&self, key: &str) -> Result<Option<DraftRecord>, CacheError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::MalformedRecord {
                key: key.to_string(),
                source,
            })
    }

    /// Overwrite the page's record
    ///
    /// # Errors
    /// [`CacheError::Encode`] if the record does not serialize,
    /// [`CacheError::Store`] if the backend write fails.
    pub fn store_record(&self, page: &PageIdentity, record: &DraftRecord) -> Result<(), CacheError> {
        let raw = serde_json::to_string(record).map_err(CacheError::Encode)?;
        let key = self.key_for(page);
        self.store.set(&key, &raw)?;
        tracing::trace!("Stored draft {} ({} fields)", key, record.form_values.len());
        Ok(())
    }

    /// Delete the page's record
    ///
    /// # Errors
    /// [`CacheError::Store`] if the backend removal fails.
    pub fn remove(&self, page: &PageIdentity) -> Result<(), CacheError> {
        let key = self.key_for(page);
        self.store.remove(&key)?;
        tracing::debug!("Removed draft {}", key);
        Ok(())
    }

    /// Every key under this cache's namespace
    ///
    /// # Errors
    /// [`CacheError::Store`] if the backend cannot list its keys.
    pub fn namespaced_keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&self.namespace))
            .collect())
    }
}

impl fmt::Debug for DraftCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftCache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
