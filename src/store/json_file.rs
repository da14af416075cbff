//! JSON file persistence with write, fsync, then rename replacement

use super::Store;
use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl<T> Store<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    async fn load(&self) -> Result<T, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved state, starting empty");
                return Ok(T::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        // The rename must not become visible before the new contents are on disk.
        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp).await.map_err(write_err)?;
        file.write_all(&bytes).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);
        tokio::fs::rename(&temp, &self.path).await.map_err(write_err)?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "State saved");
        Ok(())
    }
}
