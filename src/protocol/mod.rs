// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the LIVISI controller.
//!
//! The coordinator talks to the controller exclusively through the
//! [`ControllerApi`] trait. [`LivisiClient`] implements it over the local
//! REST API (reqwest) and the event WebSocket (tokio-tungstenite).
//!
//! # Protocols
//!
//! - REST: OAuth password grant, then bearer-authenticated `GET` requests
//! - WebSocket: `ws://<host>:<port>/events?token=<token>`, one JSON event per
//!   text frame

#[cfg(feature = "client")]
mod http;
#[cfg(feature = "client")]
mod websocket;

use std::fmt;
use std::future::Future;

use tokio::sync::mpsc;

#[cfg(feature = "client")]
pub use http::{HttpConfig, LivisiClient};
#[cfg(feature = "client")]
pub use websocket::event_stream_url;

use crate::error::Result;
use crate::types::{CapabilityState, ControllerInfo, Device, Room};

/// Credentials used to obtain an access token.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionData {
    /// Controller host name or IP address.
    pub host: String,
    /// Password of the controller's local `admin` user.
    pub password: String,
}

impl ConnectionData {
    /// Creates connection data for `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionData")
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Operations the coordinator needs from the controller.
///
/// A single instance is shared between the poll path and the stream path,
/// so a token refreshed by one is seen by the other.
pub trait ControllerApi: Send + Sync {
    /// Authenticates with `connection` and caches the resulting token.
    fn set_token(&self, connection: &ConnectionData) -> impl Future<Output = Result<()>> + Send;

    /// Returns the connection data of the cached session, if authenticated.
    fn connection_data(&self) -> Option<ConnectionData>;

    /// Fetches controller metadata.
    fn get_controller(&self) -> impl Future<Output = Result<ControllerInfo>> + Send;

    /// Fetches all devices.
    ///
    /// Fails with [`Error::TokenExpired`](crate::Error::TokenExpired) when
    /// the cached token is no longer valid.
    fn get_devices(&self) -> impl Future<Output = Result<Vec<Device>>> + Send;

    /// Fetches the state object of a capability.
    ///
    /// `capability` is the capability path without its leading separator,
    /// e.g. `capability/3f2a`. Returns `None` if the controller has no state.
    fn get_device_state(
        &self,
        capability: &str,
    ) -> impl Future<Output = Result<Option<CapabilityState>>> + Send;

    /// Fetches all rooms.
    fn get_all_rooms(&self) -> impl Future<Output = Result<Vec<Room>>> + Send;

    /// Opens the event stream on `port` with the current token.
    ///
    /// The receiver yields raw text frames; it returns `None` once the
    /// connection is closed.
    fn open_event_stream(
        &self,
        port: u16,
    ) -> impl Future<Output = Result<mpsc::Receiver<String>>> + Send;
}
