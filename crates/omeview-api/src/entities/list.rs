// Growable entity list observed by UI bindings.
//
// The orphaned-image population appends batch-by-batch, so consumers bound
// to the list see partial results stream in. Length changes are broadcast
// through a `watch` channel; the lock is never held across an await.

use std::sync::RwLock;

use tokio::sync::watch;

use super::entity::ServerEntity;

/// A thread-safe, observable, append-only list of entities.
pub struct EntityList {
    inner: RwLock<Vec<ServerEntity>>,
    len_tx: watch::Sender<usize>,
}

impl EntityList {
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            inner: RwLock::new(Vec::new()),
            len_tx,
        }
    }

    /// Append a batch of entities and notify subscribers of the new length.
    pub fn extend<I: IntoIterator<Item = ServerEntity>>(&self, entities: I) {
        let len = {
            let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            inner.extend(entities);
            inner.len()
        };
        self.len_tx.send_modify(|current| *current = len);
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the current contents.
    pub fn snapshot(&self) -> Vec<ServerEntity> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to length changes.
    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }
}

impl Default for EntityList {
    fn default() -> Self {
        Self::new()
    }
}
