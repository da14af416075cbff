//! Durable state: the watchlist and the per-ticker status map.
//!
//! Both structures are loaded and saved whole. Access goes through
//! [`LockedStore`], which serialises load-modify-save sequences so two
//! writers can never interleave and lose an update.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{StatusMap, Watchlist};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Full-structure persistence contract.
///
/// `load` returns `T::default()` when nothing has been saved yet.
/// `save` replaces the stored value atomically.
#[async_trait::async_trait]
pub trait Store<T>: Send + Sync {
    async fn load(&self) -> Result<T, StoreError>;
    async fn save(&self, value: &T) -> Result<(), StoreError>;
}

pub type WatchlistStore = LockedStore<Watchlist>;
pub type StatusStore = LockedStore<StatusMap>;

/// A store plus the lock that every reader and writer must hold.
pub struct LockedStore<T> {
    inner: Arc<dyn Store<T>>,
    lock: Mutex<()>,
}

impl<T> LockedStore<T>
where
    T: Send + Sync,
{
    pub fn new(inner: Arc<dyn Store<T>>) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    /// Consistent copy of the current value.
    pub async fn snapshot(&self) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        self.inner.load().await
    }

    /// Load the value and hold the lock until the returned guard is
    /// committed or dropped. Dropping without commit discards changes.
    pub async fn lock(&self) -> Result<StoreGuard<'_, T>, StoreError> {
        let guard = self.lock.lock().await;
        let value = self.inner.load().await?;
        Ok(StoreGuard {
            value,
            store: self.inner.as_ref(),
            _guard: guard,
        })
    }
}

/// Exclusive, loaded view of a store's value.
pub struct StoreGuard<'a, T> {
    value: T,
    store: &'a dyn Store<T>,
    _guard: MutexGuard<'a, ()>,
}

impl<T> StoreGuard<'_, T> {
    /// Persist the (possibly modified) value and release the lock.
    pub async fn commit(self) -> Result<T, StoreError> {
        self.store.save(&self.value).await?;
        Ok(self.value)
    }
}

impl<T> Deref for StoreGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for StoreGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
