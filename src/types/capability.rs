// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability state objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a capability state object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    /// Current value.
    #[serde(default)]
    pub value: Option<Value>,
    /// When the value last changed, as reported by the controller.
    #[serde(default)]
    pub last_changed: Option<String>,
}

/// Current state of a single capability, keyed by state name.
///
/// Properties are kept as raw JSON and only the requested key is
/// interpreted, so entries of an unexpected shape do not affect lookups of
/// other keys.
///
/// # Examples
///
/// ```
/// use livisi_sync::types::CapabilityState;
///
/// let json = r#"{"onState": {"value": true, "lastChanged": "2024-01-01T00:00:00Z"}}"#;
/// let state: CapabilityState = serde_json::from_str(json).unwrap();
///
/// assert_eq!(state.value("onState"), Some(&serde_json::json!(true)));
/// assert_eq!(state.value("luminance"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityState(Map<String, Value>);

impl CapabilityState {
    /// Creates an empty state object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, replacing any previous entry for `key`.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut entry = Map::new();
        entry.insert("value".to_string(), value.into());
        self.0.insert(key.into(), Value::Object(entry));
        self
    }

    /// Returns the value stored under `key`, if any.
    ///
    /// `null` values and entries that are not objects yield `None`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0
            .get(key)?
            .get("value")
            .filter(|value| !value.is_null())
    }

    /// Returns the entry stored under `key`, if it has the entry shape.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<StateEntry> {
        self.0
            .get(key)
            .filter(|raw| raw.is_object())
            .and_then(|raw| StateEntry::deserialize(raw).ok())
    }

    /// Returns `true` if the object holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
