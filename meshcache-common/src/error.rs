//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::sync::Arc;

/// The broad category a [`Error`] falls into.
///
/// Only `PeerFailure` is ever recovered locally; every other kind propagates
/// to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An empty or otherwise malformed key was passed to `Group::get`.
    InvalidArgument,
    /// The user-supplied loader returned an error, or panicked under single-flight.
    LoaderFailure,
    /// A remote peer fetch failed (network, non-200, decode).
    PeerFailure,
    /// A fatal, fail-fast programming error (duplicate group, double picker registration).
    ConfigError,
    /// A server-side protocol violation (malformed URL, missing group).
    ProtocolError,
}

/// The error type shared by every meshcache component.
#[derive(Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { kind, message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn loader_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LoaderFailure, message)
    }

    pub fn peer_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PeerFailure, message)
    }

    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolError, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A cheaply-cloneable handle to an [`Error`], used to fan a single load
/// failure out to every single-flight waiter without re-running the loader.
pub type SharedError = Arc<Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = Error::invalid_argument("key is required");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("key is required"));
    }

    #[test]
    fn shared_error_clones_cheaply() {
        let err: SharedError = Arc::new(Error::loader_failure("boom"));
        let cloned = err.clone();
        assert_eq!(cloned.kind(), ErrorKind::LoaderFailure);
    }
}
