//! Persistence for the last confirmed city.
//!
//! A single `city` slot, last write wins. Read failures read as "never set";
//! write failures are returned so the caller can log them, but nothing on the
//! forecast path waits on a write.

use async_trait::async_trait;
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::StoreError;

#[async_trait]
pub trait LastLocationStore: Send + Sync + Debug {
    async fn get(&self) -> Option<String>;

    async fn put(&self, city: &str) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    city: Option<String>,
}

/// `state.toml` in the platform data directory.
///
/// Writes from one store (and its clones) are serialized, and each one
/// replaces the file with a rename, so a reader never sees a torn file.
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    path: PathBuf,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::default(),
        }
    }

    pub fn from_platform_dirs() -> Result<Self, StoreError> {
        let dirs =
            ProjectDirs::from("dev", "weather-task", "weather-cli").ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().join("state.toml")))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read(&self) -> Result<PersistedState, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(PersistedState::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn write(&self, state: &PersistedState) -> Result<(), StoreError> {
        let contents = toml::to_string_pretty(state)?;

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, contents.as_bytes()))
            .await
            .map_err(std::io::Error::other)
            .and_then(|res| res)
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Write `contents` to a temporary file beside `path`, then rename it over
/// `path`.
fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[async_trait]
impl LastLocationStore for FileLocationStore {
    async fn get(&self) -> Option<String> {
        match self.read().await {
            Ok(state) => state.city.filter(|c| !c.trim().is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "could not read last city");
                None
            }
        }
    }

    async fn put(&self, city: &str) -> Result<(), StoreError> {
        self.write(&PersistedState {
            city: Some(city.to_string()),
        })
        .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Process-local slot; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    city: Mutex<Option<String>>,
    puts: Mutex<Vec<String>>,
}

impl MemoryLocationStore {
    pub fn with_city(city: impl Into<String>) -> Self {
        Self {
            city: Mutex::new(Some(city.into())),
            puts: Mutex::new(Vec::new()),
        }
    }

    /// Every value passed to `put`, oldest first.
    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().clone()
    }
}

#[async_trait]
impl LastLocationStore for MemoryLocationStore {
    async fn get(&self) -> Option<String> {
        self.city.lock().clone()
    }

    async fn put(&self, city: &str) -> Result<(), StoreError> {
        self.puts.lock().push(city.to_string());
        *self.city.lock() = Some(city.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.city.lock() = None;
        Ok(())
    }
}
