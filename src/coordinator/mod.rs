// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synchronization coordinator.
//!
//! The [`Coordinator`] keeps a local view of a controller's devices in sync
//! through two independent paths:
//!
//! - the poll path ([`refresh`](Coordinator::refresh), usually driven by
//!   [`spawn_poller`](Coordinator::spawn_poller)) replaces the device snapshot
//!   and capability index wholesale
//! - the stream path ([`ws_connect`](Coordinator::ws_connect)) translates
//!   event stream records into dispatcher publishes and host events
//!
//! Both paths share one [`ControllerApi`] instance, so a token refreshed by
//! the poll path is used by later stream reconnects.
//!
//! # Examples
//!
//! ```no_run
//! use livisi_sync::coordinator::{Coordinator, CoordinatorConfig};
//! use livisi_sync::protocol::LivisiClient;
//! use livisi_sync::subscription::Subscribable;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> livisi_sync::Result<()> {
//! let config = CoordinatorConfig::new("192.168.1.10", "secret");
//! let coordinator = Coordinator::new(LivisiClient::new()?, config);
//!
//! coordinator.setup().await?;
//! coordinator.load_rooms().await?;
//! let devices = coordinator.refresh().await?;
//!
//! for device in &devices {
//!     coordinator.register_device(&device.id);
//!     coordinator.on_reachability_changed(&device.id, |reachable| {
//!         println!("reachable: {reachable}");
//!     });
//! }
//!
//! let poller = coordinator.spawn_poller(CancellationToken::new());
//! let stream = coordinator.ws_connect().await?;
//! # poller.shutdown();
//! # stream.shutdown();
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatch;
mod poller;
mod registry;
mod stream;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{Mutex, watch};

pub use config::{CoordinatorConfig, ReconnectionPolicy};
pub use poller::PollerHandle;
pub use registry::{DeviceSnapshot, KnownDevices, RoomRegistry};
pub use stream::{StreamHandle, StreamState};

use crate::error::{Error, Result};
use crate::event::EventBus;
use crate::protocol::ControllerApi;
use crate::subscription::{Dispatcher, Signal, Subscribable, SubscriptionId};
use crate::types::{ControllerDescriptor, Device};

/// Keeps the local device view in sync with a LIVISI controller.
///
/// Cloning is cheap; clones share all state, which is how the background
/// poll and stream tasks reach the coordinator.
pub struct Coordinator<C> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    client: C,
    config: CoordinatorConfig,
    controller: RwLock<Option<ControllerDescriptor>>,
    snapshot: watch::Sender<Arc<DeviceSnapshot>>,
    rooms: RoomRegistry,
    known_devices: KnownDevices,
    dispatcher: Dispatcher,
    event_bus: EventBus,
    last_update_success: AtomicBool,
    stream: Mutex<Option<StreamHandle>>,
    stream_state: watch::Sender<StreamState>,
}

impl<C> Clone for Coordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("host", &self.inner.config.host)
            .field("controller", &*self.inner.controller.read())
            .field("devices", &self.inner.snapshot.borrow().devices().len())
            .field("stream_state", &*self.inner.stream_state.borrow())
            .finish_non_exhaustive()
    }
}

impl<C: ControllerApi> Coordinator<C> {
    /// Creates a coordinator with an empty registry.
    ///
    /// An event capacity of zero is raised to one.
    #[must_use]
    pub fn new(client: C, config: CoordinatorConfig) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(DeviceSnapshot::default()));
        let (stream_state, _) = watch::channel(StreamState::Disconnected);
        let event_bus = EventBus::with_capacity(config.event_capacity.max(1));

        Self {
            inner: Arc::new(Inner {
                client,
                config,
                controller: RwLock::new(None),
                snapshot,
                rooms: RoomRegistry::new(),
                known_devices: KnownDevices::new(),
                dispatcher: Dispatcher::new(),
                event_bus,
                last_update_success: AtomicBool::new(true),
                stream: Mutex::new(None),
                stream_state,
            }),
        }
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Authenticates if needed and reads the controller descriptor.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if authentication or the metadata fetch
    /// fails. Nothing is retried.
    pub async fn setup(&self) -> Result<ControllerDescriptor> {
        let client = &self.inner.client;

        if client.connection_data().is_none() {
            tracing::debug!(host = %self.inner.config.host, "No cached session, authenticating");
            client.set_token(&self.inner.config.connection_data()).await?;
        }

        let descriptor = ControllerDescriptor::from(client.get_controller().await?);
        tracing::info!(
            serial_number = %descriptor.serial_number,
            controller_type = %descriptor.controller_type,
            port = descriptor.port,
            "Controller set up"
        );

        *self.inner.controller.write() = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// Returns the controller descriptor stored by [`setup`](Self::setup).
    #[must_use]
    pub fn controller(&self) -> Option<ControllerDescriptor> {
        self.inner.controller.read().clone()
    }

    // =========================================================================
    // Poll cycle
    // =========================================================================

    /// Fetches all devices and replaces the snapshot and capability index.
    ///
    /// An expired token is refreshed once and the fetch retried once. The
    /// previous snapshot stays in place whenever this fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpdateFailed`] if the controller is unreachable or
    /// the token refresh or retry fails; any other error unchanged.
    pub async fn get_devices(&self) -> Result<Vec<Device>> {
        let client = &self.inner.client;

        let devices = match client.get_devices().await {
            Ok(devices) => devices,
            Err(Error::TokenExpired) => {
                tracing::warn!("Access token expired, refreshing");
                let connection = client
                    .connection_data()
                    .unwrap_or_else(|| self.inner.config.connection_data());
                client
                    .set_token(&connection)
                    .await
                    .map_err(|e| Error::update_failed("token refresh failed", e))?;
                client
                    .get_devices()
                    .await
                    .map_err(|e| Error::update_failed("device fetch failed after token refresh", e))?
            }
            Err(e) if e.is_connectivity() => {
                return Err(Error::update_failed("controller unreachable", e));
            }
            Err(e) => return Err(e),
        };

        let snapshot = Arc::new(DeviceSnapshot::from_devices(devices));
        tracing::debug!(
            devices = snapshot.devices().len(),
            capabilities = snapshot.capability_index().len(),
            "Replacing device snapshot"
        );
        self.inner.snapshot.send_replace(Arc::clone(&snapshot));

        Ok(snapshot.devices().to_vec())
    }

    /// Runs one poll cycle and records its outcome.
    ///
    /// # Errors
    ///
    /// Same as [`get_devices`](Self::get_devices).
    pub async fn refresh(&self) -> Result<Vec<Device>> {
        let result = self.get_devices().await;
        match &result {
            Ok(devices) => tracing::debug!(devices = devices.len(), "Poll cycle finished"),
            Err(e) => tracing::warn!(error = %e, "Poll cycle failed"),
        }
        self.inner
            .last_update_success
            .store(result.is_ok(), Ordering::Relaxed);
        result
    }

    /// Returns `false` if the last poll cycle failed.
    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.inner.last_update_success.load(Ordering::Relaxed)
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        Arc::clone(&*self.inner.snapshot.borrow())
    }

    /// Returns the devices of the current snapshot.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.snapshot().devices().to_vec()
    }

    /// Subscribes to snapshot replacements.
    #[must_use]
    pub fn subscribe_devices(&self) -> watch::Receiver<Arc<DeviceSnapshot>> {
        self.inner.snapshot.subscribe()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Reads one state value of a capability.
    ///
    /// The first character of `capability_id` is dropped before the request
    /// (`/capability/c1` is addressed as `capability/c1`).
    ///
    /// # Errors
    ///
    /// Returns error if the state request fails.
    pub async fn get_device_state(&self, capability_id: &str, key: &str) -> Result<Option<Value>> {
        let mut chars = capability_id.chars();
        chars.next();

        let Some(state) = self.inner.client.get_device_state(chars.as_str()).await? else {
            return Ok(None);
        };
        Ok(state.value(key).cloned())
    }

    /// Loads all rooms, replacing previously loaded ones.
    ///
    /// # Errors
    ///
    /// Returns error if the room request fails.
    pub async fn load_rooms(&self) -> Result<()> {
        let rooms = self.inner.client.get_all_rooms().await?;
        self.inner.rooms.replace(&rooms);
        tracing::debug!(rooms = rooms.len(), "Rooms loaded");
        Ok(())
    }

    /// Returns the name of the room `device` is located in.
    #[must_use]
    pub fn get_room_name(&self, device: &Device) -> Option<String> {
        self.inner.rooms.name(device.location.as_deref()?)
    }

    // =========================================================================
    // Known devices
    // =========================================================================

    /// Adds a device to the set notified when the event stream drops.
    pub fn register_device(&self, device_id: impl Into<String>) -> bool {
        self.inner.known_devices.insert(device_id)
    }

    /// Removes a device from the known set.
    pub fn unregister_device(&self, device_id: &str) -> bool {
        self.inner.known_devices.remove(device_id)
    }

    /// Returns the known device ids, sorted.
    #[must_use]
    pub fn known_devices(&self) -> Vec<String> {
        self.inner.known_devices.snapshot()
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    /// Returns the shared controller client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Returns the dispatcher state and reachability changes go to.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Returns the bus host events are fired on.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}

impl<C: ControllerApi> Subscribable for Coordinator<C> {
    fn on_state_changed<F>(&self, source: &str, callback: F) -> SubscriptionId
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on_state_changed(source, callback)
    }

    fn on_reachability_changed<F>(&self, source: &str, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on_reachability_changed(source, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }
}
