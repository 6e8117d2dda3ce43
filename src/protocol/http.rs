// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST client for the LIVISI local API.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use crate::error::{Error, ParseError, ProtocolError, Result};
use crate::protocol::{ConnectionData, ControllerApi, websocket};
use crate::types::{CapabilityState, ControllerInfo, Device, Room};

/// OAuth client id of the local API.
const CLIENT_ID: &str = "clientId";
/// OAuth client secret of the local API.
const CLIENT_SECRET: &str = "clientPass";
/// Local user every controller ships with.
const USERNAME: &str = "admin";
/// Prefix the controller puts in front of room ids in device records.
const LOCATION_PREFIX: &str = "/location/";

/// Vendor error code for an expired session.
const ERROR_SESSION_EXPIRED: i64 = 2007;
/// Vendor error code for wrong user credentials.
const ERROR_INVALID_CREDENTIALS: i64 = 2009;

// ============================================================================
// HttpConfig
// ============================================================================

/// Configuration of the REST client.
///
/// The host comes from the [`ConnectionData`] passed to
/// [`set_token`](ControllerApi::set_token); this only holds transport settings.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use livisi_sync::protocol::HttpConfig;
///
/// let config = HttpConfig::new()
///     .with_port(8080)
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url("192.168.1.10"), "http://192.168.1.10:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    port: u16,
    timeout: Duration,
}

impl HttpConfig {
    /// Port of the local REST API.
    pub const DEFAULT_PORT: u16 = 8080;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with default port and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom API port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the API port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL for `host`.
    #[must_use]
    pub fn base_url(&self, host: &str) -> String {
        format!("http://{host}:{}", self.port)
    }

    /// Creates a [`LivisiClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> std::result::Result<LivisiClient, ProtocolError> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(LivisiClient {
            http,
            config: self,
            session: RwLock::new(None),
        })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// LivisiClient
// ============================================================================

#[derive(Debug, Clone)]
struct Session {
    connection: ConnectionData,
    token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errorcode: i64,
    #[serde(default)]
    description: Option<String>,
}

/// Client for a LIVISI smart home controller.
///
/// Holds the session (connection data and access token) behind a lock so
/// one instance can be shared by the poll and stream paths.
///
/// # Examples
///
/// ```no_run
/// use livisi_sync::protocol::{ConnectionData, ControllerApi, LivisiClient};
///
/// # async fn example() -> livisi_sync::Result<()> {
/// let client = LivisiClient::new()?;
/// client.set_token(&ConnectionData::new("192.168.1.10", "secret")).await?;
///
/// let devices = client.get_devices().await?;
/// println!("{} devices", devices.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LivisiClient {
    http: Client,
    config: HttpConfig,
    session: RwLock<Option<Session>>,
}

impl LivisiClient {
    /// Creates a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Ok(HttpConfig::new().into_client()?)
    }

    /// Returns the current access token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.token.clone())
    }

    /// Drops the cached session.
    pub fn clear_token(&self) {
        *self.session.write() = None;
    }

    fn session(&self) -> Result<Session> {
        self.session.read().clone().ok_or(Error::NotConfigured)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let session = self.session()?;
        let url = format!("{}/{path}", self.config.base_url(&session.connection.host));

        tracing::debug!(url = %url, "Sending GET request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&session.token)
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        read_body(response).await
    }
}

/// Reads a response body, mapping vendor error payloads to errors.
async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(ProtocolError::Http)?;

    tracing::debug!(status = status.as_u16(), body = %body, "Received HTTP response");

    if let Ok(error) = serde_json::from_str::<ErrorBody>(&body) {
        return Err(match error.errorcode {
            ERROR_SESSION_EXPIRED => Error::TokenExpired,
            ERROR_INVALID_CREDENTIALS => Error::InvalidCredentials,
            code => Error::Controller {
                code,
                message: error.description.unwrap_or_default(),
            },
        });
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::TokenExpired);
    }

    if !status.is_success() {
        return Err(ProtocolError::ConnectionFailed(format!(
            "HTTP {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ))
        .into());
    }

    Ok(body)
}

fn normalize_location(mut device: Device) -> Device {
    let room = device
        .location
        .as_deref()
        .and_then(|location| location.strip_prefix(LOCATION_PREFIX))
        .map(ToString::to_string);
    if room.is_some() {
        device.location = room;
    }
    device
}

impl ControllerApi for LivisiClient {
    async fn set_token(&self, connection: &ConnectionData) -> Result<()> {
        let url = format!("{}/auth/token", self.config.base_url(&connection.host));

        tracing::debug!(url = %url, "Requesting access token");

        let response = self
            .http
            .post(&url)
            .basic_auth(CLIENT_ID, Some(CLIENT_SECRET))
            .json(&serde_json::json!({
                "username": USERNAME,
                "password": connection.password,
                "grant_type": "password",
            }))
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let body = read_body(response).await?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(ParseError::Json)?;

        *self.session.write() = Some(Session {
            connection: connection.clone(),
            token: token.access_token,
        });
        tracing::info!(host = %connection.host, "Obtained access token");
        Ok(())
    }

    fn connection_data(&self) -> Option<ConnectionData> {
        self.session.read().as_ref().map(|s| s.connection.clone())
    }

    async fn get_controller(&self) -> Result<ControllerInfo> {
        self.get_json("status").await
    }

    async fn get_devices(&self) -> Result<Vec<Device>> {
        let devices: Vec<Device> = self.get_json("device").await?;
        Ok(devices.into_iter().map(normalize_location).collect())
    }

    async fn get_device_state(&self, capability: &str) -> Result<Option<CapabilityState>> {
        let body = self.get_text(&format!("{capability}/state")).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
    }

    async fn get_all_rooms(&self) -> Result<Vec<Room>> {
        self.get_json("location").await
    }

    async fn open_event_stream(&self, port: u16) -> Result<mpsc::Receiver<String>> {
        let session = self.session()?;
        let url = websocket::event_stream_url(&session.connection.host, port, &session.token);
        Ok(websocket::connect(&url).await?)
    }
}
