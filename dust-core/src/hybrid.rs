use crate::config::{HostAddress, StorageConfig};
use crate::content::{ContentFile, StoredFile};
use crate::distributed::DistributedStorage;
use crate::error::{Result, StorageError};
use crate::storage::{Listing, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// [`DistributedStorage`] plus a local mirror of every object under `root`.
///
/// The mirror answers `path`, `listdir` and the timestamp queries. Content,
/// existence, size and naming still come from the hosts, so the mirror and
/// the hosts can drift apart; nothing reconciles them.
#[derive(Clone)]
pub struct HybridStorage {
    inner: DistributedStorage,
    root: PathBuf,
}

impl HybridStorage {
    pub fn new(config: &StorageConfig, root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_storage(DistributedStorage::new(config)?, root))
    }

    pub fn with_storage(inner: DistributedStorage, root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn distributed(&self) -> &DistributedStorage {
        &self.inner
    }

    fn mirror_path(&self, name: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for component in name.split('/').filter(|component| !component.is_empty()) {
            if component == "." || component == ".." {
                return Err(StorageError::InvalidName(format!(
                    "'{}' escapes the mirror root",
                    name
                )));
            }
            path.push(component);
        }
        Ok(path)
    }
}

#[async_trait]
impl Storage for HybridStorage {
    fn hosts(&self) -> &[HostAddress] {
        self.inner.hosts()
    }

    async fn open(&self, name: &str) -> Result<StoredFile> {
        self.inner.open(name).await
    }

    async fn save_as(&self, name: &str, content: ContentFile) -> Result<()> {
        let path = self.mirror_path(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content.bytes()).await?;
        tracing::debug!("Mirrored {} to {}", name, path.display());

        self.inner.save_as(name, content).await
    }

    /// The mirror copy goes only once every host has dropped the object.
    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.mirror_path(name)?;
        self.inner.delete(name).await?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} was not mirrored at {}", name, path.display());
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.inner.exists(name).await
    }

    async fn size(&self, name: &str) -> Result<u64> {
        self.inner.size(name).await
    }

    fn url(&self, name: &str) -> String {
        self.inner.url(name)
    }

    fn get_valid_name(&self, name: &str) -> Result<String> {
        self.inner.get_valid_name(name)
    }

    async fn get_available_name(&self, name: &str) -> Result<String> {
        self.inner.get_available_name(name).await
    }

    fn path(&self, name: &str) -> Result<PathBuf> {
        self.mirror_path(name)
    }

    async fn listdir(&self, path: &str) -> Result<Listing> {
        let dir = self.mirror_path(path)?;
        let mut listing = Listing::default();
        let mut entries = tokio::fs::read_dir(&dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().map(str::to_string) else {
                tracing::warn!(
                    "Skipping non UTF-8 entry {} in {}",
                    file_name.to_string_lossy(),
                    dir.display()
                );
                continue;
            };
            if entry.file_type().await?.is_dir() {
                listing.directories.push(name);
            } else {
                listing.files.push(name);
            }
        }

        listing.directories.sort();
        listing.files.sort();
        Ok(listing)
    }

    async fn accessed_time(&self, name: &str) -> Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(self.mirror_path(name)?).await?;
        Ok(to_utc(metadata.accessed()?))
    }

    async fn created_time(&self, name: &str) -> Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(self.mirror_path(name)?).await?;
        Ok(to_utc(metadata.created()?))
    }

    async fn modified_time(&self, name: &str) -> Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(self.mirror_path(name)?).await?;
        Ok(to_utc(metadata.modified()?))
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
