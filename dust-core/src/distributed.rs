use crate::config::{HostAddress, ResolvedConfig, StorageConfig, join_segments};
use crate::content::{ContentFile, StoredFile};
use crate::coordinator::ReplicationCoordinator;
use crate::error::{Result, StorageError};
use crate::naming;
use crate::safety;
use crate::storage::Storage;
use crate::transport::{HttpTransport, Transport};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;

/// Storage replicated over plain HTTP hosts, with no local copy.
///
/// Writes and deletes go to every host; reads are served by the first host
/// that has the object. Nothing is cached between calls.
#[derive(Clone)]
pub struct DistributedStorage {
    coordinator: ReplicationCoordinator,
    base_url: Option<Url>,
}

impl DistributedStorage {
    /// Builds the storage, reading the process-wide switch in
    /// [`crate::safety`] unless the config overrides it.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let fatal = config.fatal_exceptions_or(safety::fatal_exceptions());
        let resolved = config.resolve(fatal)?;
        let transport = HttpTransport::new(resolved.timeout).map_err(|error| {
            StorageError::InvalidConfig(format!("failed to build HTTP client: {}", error))
        })?;
        Self::with_transport(resolved, Arc::new(transport))
    }

    pub fn with_transport(config: ResolvedConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let coordinator = ReplicationCoordinator::new(config.hosts, transport)?;
        tracing::debug!(
            "Distributed storage over {} hosts, base_url={:?}",
            coordinator.hosts().len(),
            config.base_url.as_ref().map(Url::as_str)
        );

        Ok(Self {
            coordinator,
            base_url: config.base_url,
        })
    }

    pub fn coordinator(&self) -> &ReplicationCoordinator {
        &self.coordinator
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }
}

#[async_trait]
impl Storage for DistributedStorage {
    fn hosts(&self) -> &[HostAddress] {
        self.coordinator.hosts()
    }

    async fn open(&self, name: &str) -> Result<StoredFile> {
        let content = self.coordinator.fetch(name).await?;
        Ok(StoredFile::new(name, content))
    }

    async fn save_as(&self, name: &str, content: ContentFile) -> Result<()> {
        self.coordinator.put_all(name, content.into_bytes()).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.coordinator.delete_all(name).await
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.coordinator.exists(name).await
    }

    async fn size(&self, name: &str) -> Result<u64> {
        self.coordinator.size(name).await
    }

    /// `{base_url}/{name}`, or the first host's own URL without a base URL.
    fn url(&self, name: &str) -> String {
        let joined = match &self.base_url {
            Some(base) => join_segments(base, name),
            None => self
                .coordinator
                .hosts()
                .first()
                .and_then(|host| host.endpoint(name).ok()),
        };

        joined.map(String::from).unwrap_or_else(|| name.to_string())
    }

    fn get_valid_name(&self, name: &str) -> Result<String> {
        naming::valid_name(name)
    }

    async fn get_available_name(&self, name: &str) -> Result<String> {
        naming::available_name(&self.coordinator, name).await
    }
}
