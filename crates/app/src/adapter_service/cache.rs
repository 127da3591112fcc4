//! Adapter cache — live adapter instances keyed by configuration id.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use minerhub_domain::id::AdapterId;
use tokio::sync::Mutex;

/// Map of live instances guarded by one async mutex.
///
/// The lock is held across the whole check-create-insert sequence, so
/// concurrent callers resolving the same id get the same instance and the
/// factory runs once. Entries stay until removed explicitly.
pub struct AdapterCache<T: ?Sized> {
    entries: Mutex<HashMap<AdapterId, Arc<T>>>,
}

impl<T: ?Sized> Default for AdapterCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> AdapterCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached instance for `id`, creating it with `create` on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error from `create`; nothing is cached in that case.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        id: AdapterId,
        create: F,
    ) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>, E>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(&id) {
            return Ok(Arc::clone(existing));
        }
        let created = create().await?;
        entries.insert(id, Arc::clone(&created));
        Ok(created)
    }

    pub async fn remove(&self, id: AdapterId) -> Option<Arc<T>> {
        self.entries.lock().await.remove(&id)
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of live instances.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
