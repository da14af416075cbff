use super::Store;
use crate::error::StoreError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Volatile store. Writes can be made to fail to exercise error paths.
pub struct MemoryStore<T> {
    value: RwLock<T>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl<T: Default> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> MemoryStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            fail_writes: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    async fn load(&self) -> Result<T, StoreError> {
        Ok(self.value.read().await.clone())
    }

    async fn save(&self, value: &T) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        *self.value.write().await = value.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
