// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room (location) records.

use serde::{Deserialize, Serialize};

/// A room configured on the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier, referenced by [`Device::location`](super::Device::location).
    pub id: String,
    /// Room configuration.
    pub config: RoomConfig,
}

/// The `config` block of a room record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Display name.
    pub name: String,
    /// Room category, e.g. `Kitchen` or `Bedroom`.
    #[serde(rename = "type", default)]
    pub room_type: Option<String>,
}

impl Room {
    /// Creates a room with the given id and display name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: RoomConfig {
                name: name.into(),
                room_type: None,
            },
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_location_record() {
        let json = r#"{"id": "r1", "config": {"name": "Kitchen", "type": "Kitchen"}}"#;
        let room: Room = serde_json::from_str(json).unwrap();

        assert_eq!(room.id, "r1");
        assert_eq!(room.name(), "Kitchen");
        assert_eq!(room.config.room_type.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn name_is_required() {
        let result = serde_json::from_str::<Room>(r#"{"id": "r1", "config": {}}"#);
        assert!(result.is_err());
    }
}
