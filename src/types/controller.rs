// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller metadata and the descriptor derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Event stream port of the second generation ("Avatar") controller.
pub const AVATAR_PORT: u16 = 9090;

/// Event stream port of the classic controller.
pub const CLASSIC_PORT: u16 = 8080;

/// Controller hardware variant.
///
/// # Examples
///
/// ```
/// use livisi_sync::types::ControllerType;
///
/// assert_eq!(ControllerType::from("Avatar"), ControllerType::Avatar);
/// assert_eq!(ControllerType::from("Classic").port(), 8080);
/// assert_eq!(ControllerType::Avatar.port(), 9090);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControllerType {
    /// SHC 2 ("Avatar").
    Avatar,
    /// SHC 1 ("Classic").
    Classic,
    /// Any other reported type; treated like a classic controller.
    Other(String),
}

impl ControllerType {
    /// Returns the port the event stream is served on.
    #[must_use]
    pub fn port(&self) -> u16 {
        match self {
            Self::Avatar => AVATAR_PORT,
            Self::Classic | Self::Other(_) => CLASSIC_PORT,
        }
    }

    /// Returns `true` for the variant with the extended feature set.
    #[must_use]
    pub fn is_avatar(&self) -> bool {
        matches!(self, Self::Avatar)
    }

    /// Returns the vendor string for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Avatar => "Avatar",
            Self::Classic => "Classic",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for ControllerType {
    fn from(value: &str) -> Self {
        match value {
            "Avatar" => Self::Avatar,
            "Classic" => Self::Classic,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ControllerType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ControllerType> for String {
    fn from(value: ControllerType) -> Self {
        match value {
            ControllerType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller metadata as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerInfo {
    /// Hardware variant.
    pub controller_type: ControllerType,
    /// Controller serial number.
    pub serial_number: String,
    /// Firmware application version.
    #[serde(default)]
    pub app_version: Option<String>,
    /// Operating system version.
    #[serde(default)]
    pub os_version: Option<String>,
}

impl ControllerInfo {
    /// Creates controller metadata with the given type and serial number.
    #[must_use]
    pub fn new(controller_type: impl Into<ControllerType>, serial_number: impl Into<String>) -> Self {
        Self {
            controller_type: controller_type.into(),
            serial_number: serial_number.into(),
            app_version: None,
            os_version: None,
        }
    }
}

/// What the coordinator remembers about the controller after setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerDescriptor {
    /// Controller serial number.
    pub serial_number: String,
    /// Hardware variant.
    pub controller_type: ControllerType,
    /// Port used for the event stream.
    pub port: u16,
    /// Whether the controller has the extended (Avatar) feature set.
    pub is_avatar: bool,
}

impl From<ControllerInfo> for ControllerDescriptor {
    fn from(info: ControllerInfo) -> Self {
        Self {
            port: info.controller_type.port(),
            is_avatar: info.controller_type.is_avatar(),
            serial_number: info.serial_number,
            controller_type: info.controller_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_response() {
        let json = r#"{
            "serialNumber": "914110001234",
            "controllerType": "Avatar",
            "appVersion": "1.2.3",
            "osVersion": "8.17"
        }"#;
        let info: ControllerInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.controller_type, ControllerType::Avatar);
        assert_eq!(info.serial_number, "914110001234");
        assert_eq!(info.app_version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn avatar_descriptor() {
        let descriptor = ControllerDescriptor::from(ControllerInfo::new("Avatar", "sn"));

        assert_eq!(descriptor.port, AVATAR_PORT);
        assert!(descriptor.is_avatar);
    }

    #[test]
    fn classic_descriptor() {
        let descriptor = ControllerDescriptor::from(ControllerInfo::new("Classic", "sn"));

        assert_eq!(descriptor.port, CLASSIC_PORT);
        assert!(!descriptor.is_avatar);
    }

    #[test]
    fn unknown_type_uses_classic_port() {
        let kind = ControllerType::from("SHC3");

        assert_eq!(kind, ControllerType::Other("SHC3".to_string()));
        assert_eq!(kind.port(), CLASSIC_PORT);
        assert!(!kind.is_avatar());
        assert_eq!(String::from(kind), "SHC3");
    }
}
