use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use ulid::Ulid;

const TEMP_DIR: &str = ".tmp";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid object name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Replaced,
}

/// Objects stored as plain files under `base_path`, one file per name.
pub struct DiskStore {
    base_path: PathBuf,
}

impl DiskStore {
    pub fn new(base_path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(base_path.join(TEMP_DIR))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Store an object, replacing any previous content.
    pub async fn put(&self, name: &str, data: Bytes) -> Result<PutOutcome> {
        let object_path = self.object_path(name)?;
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let existed = fs::try_exists(&object_path).await?;

        // Write to temporary file first, then rename for atomicity
        let temp_path = self.base_path.join(TEMP_DIR).join(Ulid::new().to_string());
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &object_path).await?;

        tracing::debug!("Stored {} ({} bytes, existed={})", name, data.len(), existed);
        Ok(if existed {
            PutOutcome::Replaced
        } else {
            PutOutcome::Created
        })
    }

    pub async fn get(&self, name: &str) -> Result<Option<Bytes>> {
        let object_path = self.object_path(name)?;
        match fs::read(&object_path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(error) if missing(&error) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn size(&self, name: &str) -> Result<Option<u64>> {
        let object_path = self.object_path(name)?;
        match fs::metadata(&object_path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(error) if missing(&error) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let object_path = self.object_path(name)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => Ok(true),
            Err(error) if missing(&error) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        let mut path = self.base_path.clone();
        let mut components = 0usize;
        for component in name.split('/').filter(|component| !component.is_empty()) {
            if component == "." || component == ".." || (components == 0 && component == TEMP_DIR)
            {
                return Err(StoreError::InvalidName(name.to_string()));
            }
            path.push(component);
            components += 1;
        }

        if components == 0 {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(path)
    }
}

fn missing(error: &std::io::Error) -> bool {
    // A file standing where a directory is expected reads as missing too.
    matches!(
        error.kind(),
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::IsADirectory
    )
}
