use crate::error::{Result, StorageError, TransportError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One backend host: `host:port` or `scheme://host:port/prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostAddress {
    raw: String,
    base: Url,
}

impl HostAddress {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Request URL for `name` on this host, one percent-encoded segment per
    /// slash-delimited component.
    pub fn endpoint(&self, name: &str) -> std::result::Result<Url, TransportError> {
        join_segments(&self.base, name).ok_or_else(|| TransportError::InvalidUrl(self.raw.clone()))
    }
}

/// Appends the slash-delimited components of `name` to the path of `base`.
pub(crate) fn join_segments(base: &Url, name: &str) -> Option<Url> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        segments.extend(name.split('/').filter(|segment| !segment.is_empty()));
    }
    Some(url)
}

impl FromStr for HostAddress {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(StorageError::InvalidConfig(
                "host address cannot be empty".to_string(),
            ));
        }

        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };

        let base = Url::parse(&with_scheme).map_err(|error| {
            StorageError::InvalidConfig(format!("invalid host address '{}': {}", raw, error))
        })?;

        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(StorageError::InvalidConfig(format!(
                "invalid host address '{}': no host",
                raw
            )));
        }
        if base.query().is_some() || base.fragment().is_some() {
            return Err(StorageError::InvalidConfig(format!(
                "invalid host address '{}': query and fragment are not allowed",
                raw
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            base,
        })
    }
}

impl TryFrom<String> for HostAddress {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HostAddress> for String {
    fn from(address: HostAddress) -> Self {
        address.raw
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Overrides the process-wide switch in [`crate::safety`] when set.
    #[serde(default)]
    pub fatal_exceptions: Option<bool>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            base_url: None,
            fatal_exceptions: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// A validated configuration. `hosts` is never empty.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub hosts: Vec<HostAddress>,
    pub base_url: Option<Url>,
    pub timeout: Duration,
}

impl StorageConfig {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_fatal_exceptions(mut self, enabled: bool) -> Self {
        self.fatal_exceptions = Some(enabled);
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(
                ::config::Environment::with_prefix("DUST")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("hosts"),
            )
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }

    /// Whether configuration errors are fatal, given the process-wide default.
    pub fn fatal_exceptions_or(&self, process_default: bool) -> bool {
        self.fatal_exceptions.unwrap_or(process_default)
    }

    /// Validates the configuration. With `fatal` unset, a bad `base_url` is
    /// logged and dropped instead of failing. Host errors are always fatal.
    pub fn resolve(&self, fatal: bool) -> Result<ResolvedConfig> {
        if self.hosts.is_empty() {
            return Err(StorageError::InvalidConfig(
                "at least one host is required".to_string(),
            ));
        }

        let hosts = self
            .hosts
            .iter()
            .map(|host| host.parse())
            .collect::<Result<Vec<HostAddress>>>()?;

        let base_url = match self.base_url.as_deref().map(parse_base_url).transpose() {
            Ok(base_url) => base_url,
            Err(error) if fatal => return Err(error),
            Err(error) => {
                tracing::warn!(
                    "Ignoring {}. Public URLs will be derived from host {}. You have been warned.",
                    error,
                    hosts[0]
                );
                None
            }
        };

        Ok(ResolvedConfig {
            hosts,
            base_url,
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        })
    }
}

pub fn parse_base_url(value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|error| {
        StorageError::InvalidConfig(format!("invalid base_url '{}': {}", value, error))
    })?;

    if url.cannot_be_a_base() {
        return Err(StorageError::InvalidConfig(format!(
            "invalid base_url '{}': not a hierarchical URL",
            value
        )));
    }
    if url.query().is_some() {
        return Err(StorageError::InvalidConfig(format!(
            "invalid base_url '{}': a query string is not allowed",
            value
        )));
    }
    if url.fragment().is_some() {
        return Err(StorageError::InvalidConfig(format!(
            "invalid base_url '{}': a fragment is not allowed",
            value
        )));
    }

    Ok(url)
}
