// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `livisi_sync` library.
//!
//! The hierarchy separates transport failures ([`ProtocolError`]), malformed
//! controller payloads ([`ParseError`]) and the controller-level conditions
//! the coordinator reacts to (expired tokens, failed update cycles).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a controller payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The cached access token is no longer accepted by the controller.
    #[error("access token expired")]
    TokenExpired,

    /// The controller rejected the configured password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The controller answered with a vendor error code.
    #[error("controller error {code}: {message}")]
    Controller {
        /// Vendor error code.
        code: i64,
        /// Description sent by the controller.
        message: String,
    },

    /// A poll cycle failed; the previous snapshot is still in place.
    #[error("update failed: {message}")]
    UpdateFailed {
        /// What the cycle was doing when it failed.
        message: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// An operation needs [`setup`](crate::Coordinator::setup) to have run first.
    #[error("controller is not set up")]
    NotConfigured,
}

impl Error {
    /// Wraps `source` into an [`Error::UpdateFailed`].
    #[must_use]
    pub fn update_failed(message: impl Into<String>, source: Error) -> Self {
        Self::UpdateFailed {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` if the error means the controller could not be reached.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_connectivity(),
            _ => false,
        }
    }

    /// Returns `true` if the error is an expired token.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }
}

/// Errors related to protocol communication (HTTP/WebSocket).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "client")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the controller failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The event stream could not be opened or broke down.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

impl ProtocolError {
    /// Returns `true` if this failure means the controller is unreachable.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            #[cfg(feature = "client")]
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::WebSocket(_) => true,
            Self::InvalidAddress(_) | Self::ChannelClosed(_) => false,
        }
    }
}

/// Errors related to parsing controller payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
