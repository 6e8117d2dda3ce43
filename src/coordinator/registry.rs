// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device, capability and room registries.
//!
//! Every registry is replaced wholesale: writers build a new value and swap
//! the `Arc`, readers clone the `Arc` and work on an immutable copy.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{Device, Room};

/// The device list of one successful poll and the index derived from it.
///
/// # Examples
///
/// ```
/// use livisi_sync::coordinator::DeviceSnapshot;
/// use livisi_sync::types::Device;
///
/// let snapshot = DeviceSnapshot::from_devices(vec![
///     Device::new("d1", ["/capability/c1", "/capability/c2"]),
///     Device::new("d2", ["/capability/c3"]),
/// ]);
///
/// assert_eq!(snapshot.device_for_capability("/capability/c3"), Some("d2"));
/// assert_eq!(snapshot.device_for_capability("/capability/c9"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    devices: Vec<Device>,
    capability_index: HashMap<String, String>,
}

impl DeviceSnapshot {
    /// Builds a snapshot and its capability index.
    ///
    /// A capability listed by several devices maps to the last one.
    #[must_use]
    pub fn from_devices(devices: Vec<Device>) -> Self {
        let mut capability_index = HashMap::new();
        for device in &devices {
            for capability in &device.capabilities {
                if let Some(previous) =
                    capability_index.insert(capability.clone(), device.id.clone())
                    && previous != device.id
                {
                    tracing::debug!(
                        capability = %capability,
                        previous = %previous,
                        device_id = %device.id,
                        "Capability listed by more than one device"
                    );
                }
            }
        }

        Self {
            devices,
            capability_index,
        }
    }

    /// Returns the devices in controller order.
    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Resolves a capability id to its owning device id.
    #[must_use]
    pub fn device_for_capability(&self, capability: &str) -> Option<&str> {
        self.capability_index.get(capability).map(String::as_str)
    }

    /// Returns the full capability index.
    #[must_use]
    pub fn capability_index(&self) -> &HashMap<String, String> {
        &self.capability_index
    }

    /// Returns `true` if no device is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Room id to display name.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    names: RwLock<Arc<HashMap<String, String>>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all rooms.
    pub fn replace(&self, rooms: &[Room]) {
        let names: HashMap<String, String> = rooms
            .iter()
            .map(|room| (room.id.clone(), room.name().to_string()))
            .collect();
        *self.names.write() = Arc::new(names);
    }

    /// Returns the display name of `room_id`.
    #[must_use]
    pub fn name(&self, room_id: &str) -> Option<String> {
        self.names.read().get(room_id).cloned()
    }

    /// Returns the number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    /// Returns `true` if no room is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}

/// Device ids registered by the entity layer.
#[derive(Debug, Default)]
pub struct KnownDevices {
    ids: RwLock<HashSet<String>>,
}

impl KnownDevices {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device id. Returns `true` if it was not known yet.
    pub fn insert(&self, device_id: impl Into<String>) -> bool {
        self.ids.write().insert(device_id.into())
    }

    /// Removes a device id. Returns `true` if it was known.
    pub fn remove(&self, device_id: &str) -> bool {
        self.ids.write().remove(device_id)
    }

    /// Returns `true` if `device_id` is known.
    #[must_use]
    pub fn contains(&self, device_id: &str) -> bool {
        self.ids.read().contains(device_id)
    }

    /// Returns a copy of the current ids, sorted.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.read().iter().cloned().collect();
        ids.sort_unstable();
        ids
    }
}
