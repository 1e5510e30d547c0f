//! Maps a host's status code to what it means for the verb that was sent.
//!
//! | verb   | Success  | Conflict | NotFound | Failed | Unexpected |
//! |--------|----------|----------|----------|--------|------------|
//! | PUT    | 201      | 200, 204 |          | >= 400 | other      |
//! | DELETE | 200, 204 |          | 404      | >= 400 | other      |
//! | HEAD   | 200      |          | 404      | >= 400 | other      |
//! | GET    | 200      |          | 404      | >= 400 | other      |
//!
//! `Unexpected` is a backend breaking the wire contract (a 202 for instance)
//! and must never be confused with a missing file.

use crate::config::HostAddress;
use crate::error::{StorageError, TransportError};
use crate::transport::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    /// PUT replaced an object that already existed.
    Conflict,
    /// An HTTP error response.
    Failed(u16),
    /// A status outside the documented contract for the verb.
    Unexpected(u16),
}

pub fn classify(method: Method, status: u16) -> Outcome {
    match (method, status) {
        (Method::Put, 201) => Outcome::Success,
        (Method::Put, 200 | 204) => Outcome::Conflict,
        (Method::Delete, 200 | 204) => Outcome::Success,
        (Method::Head | Method::Get, 200) => Outcome::Success,
        (Method::Delete | Method::Head | Method::Get, 404) => Outcome::NotFound,
        (_, code) if code >= 400 => Outcome::Failed(code),
        (_, code) => Outcome::Unexpected(code),
    }
}

impl Outcome {
    /// The error a caller sees for this outcome, if it is a failure.
    pub fn into_error(self, host: &HostAddress, method: Method, name: &str) -> Option<StorageError> {
        match self {
            Self::Success | Self::NotFound | Self::Conflict => None,
            Self::Failed(status) => Some(StorageError::transport(
                host.as_str(),
                TransportError::HttpStatus(status),
            )),
            Self::Unexpected(status) => Some(StorageError::UnexpectedStatusCode {
                host: host.to_string(),
                method: method.as_str(),
                name: name.to_string(),
                status,
            }),
        }
    }
}
