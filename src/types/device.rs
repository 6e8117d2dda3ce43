// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records as reported by the controller.

use serde::{Deserialize, Serialize};

/// A device known to the controller.
///
/// Only `id`, `capabilities` and `location` drive synchronization; the
/// remaining fields are carried through for the entity layer.
///
/// # Examples
///
/// ```
/// use livisi_sync::types::Device;
///
/// let json = r#"{
///     "id": "d1",
///     "type": "PSS",
///     "capabilities": ["/capability/c1", "/capability/c2"],
///     "location": "r1"
/// }"#;
/// let device: Device = serde_json::from_str(json).unwrap();
///
/// assert_eq!(device.id, "d1");
/// assert_eq!(device.capabilities.len(), 2);
/// assert_eq!(device.location.as_deref(), Some("r1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device identifier.
    pub id: String,

    /// Capability identifiers owned by this device, in controller order.
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Room identifier, if the device is assigned to one.
    #[serde(default)]
    pub location: Option<String>,

    /// Vendor device type (e.g. `PSS`, `WMD`, `RST`).
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,

    /// Manufacturer name.
    #[serde(default)]
    pub manufacturer: Option<String>,

    /// Hardware serial number.
    #[serde(default)]
    pub serial_number: Option<String>,

    /// Device configuration block.
    #[serde(default)]
    pub config: DeviceSettings,
}

/// The `config` block of a device record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// User-assigned device name.
    #[serde(default)]
    pub name: Option<String>,
}

impl Device {
    /// Creates a device with the given id and capabilities.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the room this device is located in.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns the user-assigned name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }
}
