//! Fans logical operations out to the configured hosts.
//!
//! Mutations go to every host at once and are judged only after every host
//! has answered. Reads walk the hosts in configured order and stop at the
//! first one that has the object. Hosts are never reconciled: divergence is
//! logged and left to the caller.

use crate::config::HostAddress;
use crate::error::{Result, StorageError};
use crate::outcome::{Outcome, classify};
use crate::transport::{Method, RawResponse, Transport};
use bytes::Bytes;
use futures_util::future::join_all;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Download,
    Check,
    Size,
}

impl ReadKind {
    fn method(self) -> Method {
        match self {
            Self::Download => Method::Get,
            Self::Check | Self::Size => Method::Head,
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::Download => "Failed to download",
            Self::Check => "Failed to check",
            Self::Size => "Failed to get the size of",
        }
    }
}

#[derive(Clone)]
pub struct ReplicationCoordinator {
    hosts: Vec<HostAddress>,
    transport: Arc<dyn Transport>,
}

impl ReplicationCoordinator {
    pub fn new(hosts: Vec<HostAddress>, transport: Arc<dyn Transport>) -> Result<Self> {
        if hosts.is_empty() {
            return Err(StorageError::InvalidConfig(
                "at least one host is required".to_string(),
            ));
        }

        Ok(Self { hosts, transport })
    }

    pub fn hosts(&self) -> &[HostAddress] {
        &self.hosts
    }

    /// Creates or overwrites `name` on every host.
    pub async fn put_all(&self, name: &str, body: Bytes) -> Result<()> {
        self.write_all(Method::Put, name, Some(body), "Failed to create")
            .await
    }

    /// Removes `name` from every host. Hosts that never had it are logged,
    /// not treated as failures.
    pub async fn delete_all(&self, name: &str) -> Result<()> {
        self.write_all(Method::Delete, name, None, "Failed to delete")
            .await
    }

    pub async fn fetch(&self, name: &str) -> Result<Bytes> {
        match self.read_with_failover(ReadKind::Download, name).await? {
            Some((_, response)) => Ok(response.body),
            None => Err(StorageError::FileNotFound(name.to_string())),
        }
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .read_with_failover(ReadKind::Check, name)
            .await?
            .is_some())
    }

    pub async fn size(&self, name: &str) -> Result<u64> {
        let Some((host, response)) = self.read_with_failover(ReadKind::Size, name).await? else {
            return Err(StorageError::FileNotFound(name.to_string()));
        };

        response.content_length().ok_or_else(|| {
            let error = StorageError::MissingContentLength {
                host: host.to_string(),
                name: name.to_string(),
            };
            tracing::error!(
                "{} {} from host {}: {}",
                ReadKind::Size.failure_message(),
                name,
                host,
                error
            );
            error
        })
    }

    async fn write_all(
        &self,
        method: Method,
        name: &str,
        body: Option<Bytes>,
        failure_message: &str,
    ) -> Result<()> {
        let attempts = self.hosts.iter().map(|host| {
            let body = body.clone();
            async move { (host, self.transport.request(host, method, name, body).await) }
        });
        let results = join_all(attempts).await;

        let mut applied = 0usize;
        let mut first_error = None;
        for (host, result) in results {
            let error = match result {
                Ok(response) => {
                    let outcome = classify(method, response.status.as_u16());
                    match outcome.into_error(host, method, name) {
                        None => {
                            applied += 1;
                            log_divergence(method, outcome, name, host);
                            continue;
                        }
                        Some(error) => error,
                    }
                }
                Err(source) => StorageError::transport(host.as_str(), source),
            };

            tracing::error!("{} {} on host {}: {}", failure_message, name, host, error);
            first_error.get_or_insert(error);
        }

        match first_error {
            None => Ok(()),
            Some(error) => {
                if applied > 0 {
                    tracing::error!(
                        "{} {}: applied on {} of {} hosts, replicas are inconsistent",
                        method,
                        name,
                        applied,
                        self.hosts.len()
                    );
                }
                Err(error)
            }
        }
    }

    /// Returns the first host that has `name`, `None` when at least one host
    /// answered not found and none had it, and the first failure when every
    /// host failed.
    async fn read_with_failover(
        &self,
        kind: ReadKind,
        name: &str,
    ) -> Result<Option<(HostAddress, RawResponse)>> {
        let method = kind.method();
        let mut not_found = false;
        let mut first_error = None;

        for host in &self.hosts {
            let error = match self.transport.request(host, method, name, None).await {
                Ok(response) => {
                    let outcome = classify(method, response.status.as_u16());
                    match outcome {
                        Outcome::Success => return Ok(Some((host.clone(), response))),
                        Outcome::NotFound => {
                            not_found = true;
                            continue;
                        }
                        _ => match outcome.into_error(host, method, name) {
                            Some(error) => error,
                            None => continue,
                        },
                    }
                }
                Err(source) => StorageError::transport(host.as_str(), source),
            };

            tracing::error!(
                "{} {} from host {}: {}",
                kind.failure_message(),
                name,
                host,
                error
            );
            first_error.get_or_insert(error);
        }

        if not_found {
            return Ok(None);
        }

        Err(first_error.unwrap_or_else(|| StorageError::FileNotFound(name.to_string())))
    }
}

fn log_divergence(method: Method, outcome: Outcome, name: &str, host: &HostAddress) {
    match (method, outcome) {
        (Method::Put, Outcome::Conflict) => {
            tracing::warn!("PUT on existing file {} on host {}", name, host);
        }
        (Method::Delete, Outcome::NotFound) => {
            tracing::warn!("DELETE on missing file {} on host {}", name, host);
        }
        _ => {
            tracing::debug!("{} {} on host {} succeeded", method, name, host);
        }
    }
}
