use thiserror::Error;

/// Failure to get a well-formed answer out of one host.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {0}")]
    HttpStatus(u16),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{operation} is not supported by this storage")]
    NotSupported { operation: &'static str },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unexpected status code {status} from {host} for {method} {name}")]
    UnexpectedStatusCode {
        host: String,
        method: &'static str,
        name: String,
        status: u16,
    },

    #[error("transport error on {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: TransportError,
    },

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid open mode {0}: files can only be opened for reading")]
    InvalidOpenMode(String),

    #[error("no content length from {host} for {name}")]
    MissingContentLength { host: String, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn transport(host: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            host: host.into(),
            source,
        }
    }

    /// True for a missing object, whether reported by the hosts or the mirror.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound(_) => true,
            Self::Io(error) => error.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The HTTP status a host answered with, when the error came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatusCode { status, .. } => Some(*status),
            Self::Transport {
                source: TransportError::HttpStatus(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
