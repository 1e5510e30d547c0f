use crate::config::HostAddress;
use crate::content::{ContentFile, OpenMode, StoredFile};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// One level of a directory: sub-directory names and file names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

/// The file storage contract callers program against.
///
/// `path`, `listdir` and the timestamp queries need a local filesystem and
/// fail with [`StorageError::NotSupported`] unless a variant has one.
#[async_trait]
pub trait Storage: Send + Sync {
    fn hosts(&self) -> &[HostAddress];

    async fn open(&self, name: &str) -> Result<StoredFile>;

    async fn open_with_mode(&self, name: &str, mode: OpenMode) -> Result<StoredFile> {
        if !mode.is_read_only() {
            return Err(StorageError::InvalidOpenMode(format!("{:?}", mode)));
        }
        self.open(name).await
    }

    /// Writes `content` to exactly `name`, replacing whatever is there.
    async fn save_as(&self, name: &str, content: ContentFile) -> Result<()>;

    /// Writes `content` under a free name derived from `name` and returns it.
    async fn save(&self, name: &str, content: ContentFile) -> Result<String> {
        let name = self.get_valid_name(name)?;
        let name = self.get_available_name(&name).await?;
        self.save_as(&name, content).await?;
        Ok(name)
    }

    async fn delete(&self, name: &str) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;

    async fn size(&self, name: &str) -> Result<u64>;

    fn url(&self, name: &str) -> String;

    fn get_valid_name(&self, name: &str) -> Result<String>;

    async fn get_available_name(&self, name: &str) -> Result<String>;

    fn path(&self, _name: &str) -> Result<PathBuf> {
        Err(StorageError::NotSupported { operation: "path" })
    }

    async fn listdir(&self, _path: &str) -> Result<Listing> {
        Err(StorageError::NotSupported {
            operation: "listdir",
        })
    }

    async fn accessed_time(&self, _name: &str) -> Result<DateTime<Utc>> {
        Err(StorageError::NotSupported {
            operation: "accessed_time",
        })
    }

    async fn created_time(&self, _name: &str) -> Result<DateTime<Utc>> {
        Err(StorageError::NotSupported {
            operation: "created_time",
        })
    }

    async fn modified_time(&self, _name: &str) -> Result<DateTime<Utc>> {
        Err(StorageError::NotSupported {
            operation: "modified_time",
        })
    }
}
