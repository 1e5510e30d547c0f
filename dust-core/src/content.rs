use crate::error::{Result, StorageError};
use bytes::Bytes;
use std::path::Path;
use std::str::FromStr;

/// Bytes handed to `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    bytes: Bytes,
}

impl ContentFile {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<&'static str> for ContentFile {
    fn from(value: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(value.as_bytes()))
    }
}

impl From<Vec<u8>> for ContentFile {
    fn from(value: Vec<u8>) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Bytes> for ContentFile {
    fn from(value: Bytes) -> Self {
        Self::from_bytes(value)
    }
}

/// An object read back from a host. Read-only.
#[derive(Debug, Clone)]
pub struct StoredFile {
    name: String,
    content: Bytes,
}

impl StoredFile {
    pub fn new(name: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn read(&self) -> &[u8] {
        &self.content
    }

    pub fn into_bytes(self) -> Bytes {
        self.content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

impl OpenMode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Read)
    }
}

/// Accepts fopen-style mode strings: `r`, `rb`, `w`, `wb`, `a`, `r+`, ...
impl FromStr for OpenMode {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self> {
        let flags: String = value.chars().filter(|c| *c != 'b' && *c != 't').collect();
        match flags.as_str() {
            "r" => Ok(Self::Read),
            "w" | "w+" | "r+" | "x" | "x+" => Ok(Self::Write),
            "a" | "a+" => Ok(Self::Append),
            _ => Err(StorageError::InvalidOpenMode(value.to_string())),
        }
    }
}
