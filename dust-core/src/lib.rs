//! Dust Core - blob storage replicated across plain HTTP hosts
//!
//! A storage facade over an ordered list of independent hosts that speak
//! `PUT`/`GET`/`HEAD`/`DELETE` on `/{name}`:
//! - writes and deletes go to every host, concurrently
//! - reads fail over across hosts in configured order
//! - divergence between hosts is logged, never repaired
//! - an optional local mirror answers listing, path and timestamp queries

pub mod config;
pub mod content;
pub mod coordinator;
pub mod distributed;
pub mod error;
pub mod hybrid;
pub mod naming;
pub mod outcome;
pub mod safety;
pub mod storage;
pub mod transport;

pub use config::{HostAddress, ResolvedConfig, StorageConfig, parse_base_url};
pub use content::{ContentFile, OpenMode, StoredFile};
pub use coordinator::{ReadKind, ReplicationCoordinator};
pub use distributed::DistributedStorage;
pub use error::{Result, StorageError, TransportError};
pub use hybrid::HybridStorage;
pub use naming::{NameParts, available_name, split_name, valid_name};
pub use outcome::{Outcome, classify};
pub use safety::{
    FatalExceptionsOverride, fatal_exceptions, reset_fatal_exceptions, set_fatal_exceptions,
};
pub use storage::{Listing, Storage};
pub use transport::{HttpTransport, Method, RawResponse, Transport};
