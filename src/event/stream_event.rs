// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of raw event stream records into typed events.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::subscription::Signal;

/// Vendor event type for button presses.
pub const STREAM_BUTTON_PRESSED: &str = "ButtonPressed";
/// Vendor event type for motion detection.
pub const STREAM_MOTION_DETECTED: &str = "MotionDetected";
/// Vendor event type for capability state changes.
pub const STREAM_STATE_CHANGED: &str = "StateChanged";

/// Climate properties in the order they are looked up.
const CLIMATE_KEYS: [&str; 4] = ["setpointTemperature", "pointTemperature", "temperature", "humidity"];

/// A record received on the event stream.
///
/// # Examples
///
/// ```
/// use livisi_sync::event::{StreamEvent, StreamRecord};
///
/// let raw = r#"{
///     "type": "MotionDetected",
///     "source": "/capability/c7",
///     "timestamp": "2024-03-01T10:15:00.000Z",
///     "properties": {"motionDetectedCount": 12}
/// }"#;
/// let record = StreamRecord::parse(raw).unwrap();
///
/// assert!(record.timestamp.is_some());
/// assert_eq!(
///     record.event,
///     StreamEvent::MotionDetected { source: "/capability/c7".into() }
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    /// When the controller emitted the event.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Vendor namespace (e.g. `core.RWE`).
    pub namespace: Option<String>,
    /// The typed event.
    pub event: StreamEvent,
}

/// A typed event from the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A push button was pressed.
    ButtonPressed {
        /// Capability that raised the event.
        source: String,
        /// Button index, if reported.
        index: Option<u32>,
        /// Press type (e.g. `ShortPress`, `LongPress`), if reported.
        press_type: Option<String>,
    },
    /// A motion detector triggered.
    MotionDetected {
        /// Capability that raised the event.
        source: String,
    },
    /// One or more properties of a capability changed.
    StateChanged {
        /// Capability (or device) whose state changed.
        source: String,
        /// The changed properties.
        properties: StateProperties,
    },
    /// An event type this library does not handle.
    Unknown {
        /// Vendor event type.
        kind: String,
        /// Source of the event.
        source: String,
    },
}

impl StreamEvent {
    /// Returns the source id of the event.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::ButtonPressed { source, .. }
            | Self::MotionDetected { source }
            | Self::StateChanged { source, .. }
            | Self::Unknown { source, .. } => source,
        }
    }
}

/// Properties carried by a `StateChanged` event.
///
/// Every field is optional: the controller only sends what changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateProperties {
    /// Switch/actuator state.
    pub on_state: Option<bool>,
    /// Climate control reading.
    pub climate: Option<f64>,
    /// Window/door contact state.
    pub is_open: Option<bool>,
    /// Luminance reading.
    pub luminance: Option<f64>,
    /// Reachability of the source.
    pub is_reachable: Option<bool>,
}

impl StateProperties {
    /// Extracts the known properties from a raw property map.
    ///
    /// The on-state falls back to a generic `value` property; the climate
    /// reading takes the first present of set point, point temperature,
    /// temperature and humidity. Values of the wrong type count as absent.
    #[must_use]
    pub fn from_map(properties: &Map<String, Value>) -> Self {
        let on_state = properties
            .get("onState")
            .or_else(|| properties.get("value"))
            .and_then(Value::as_bool);

        let climate = CLIMATE_KEYS
            .iter()
            .find_map(|key| properties.get(*key))
            .and_then(Value::as_f64);

        Self {
            on_state,
            climate,
            is_open: properties.get("isOpen").and_then(Value::as_bool),
            luminance: properties.get("luminance").and_then(Value::as_f64),
            is_reachable: properties.get("isReachable").and_then(Value::as_bool),
        }
    }

    /// Returns the populated state fields as signals, in publish order.
    ///
    /// Reachability is not included; see [`reachability`](Self::reachability).
    #[must_use]
    pub fn state_signals(&self) -> Vec<Signal> {
        [
            self.on_state.map(Signal::OnState),
            self.climate.map(Signal::Climate),
            self.is_open.map(Signal::IsOpen),
            self.luminance.map(Signal::Luminance),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Returns the reachability signal, if present.
    #[must_use]
    pub fn reachability(&self) -> Option<Signal> {
        self.is_reachable.map(Signal::Reachable)
    }

    /// Returns `true` if no property is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state_signals().is_empty() && self.is_reachable.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

impl StreamRecord {
    /// Parses a raw text frame from the event stream.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the frame is not JSON or lacks `type` or `source`.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let record: RawRecord = serde_json::from_str(raw)?;

        let kind = record
            .kind
            .ok_or_else(|| ParseError::MissingField("type".to_string()))?;
        let source = record
            .source
            .ok_or_else(|| ParseError::MissingField("source".to_string()))?;
        let properties = record.properties.unwrap_or_default();

        let event = match kind.as_str() {
            STREAM_BUTTON_PRESSED => StreamEvent::ButtonPressed {
                source,
                index: properties
                    .get("index")
                    .and_then(Value::as_u64)
                    .and_then(|index| u32::try_from(index).ok()),
                press_type: properties
                    .get("type")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
            },
            STREAM_MOTION_DETECTED => StreamEvent::MotionDetected { source },
            STREAM_STATE_CHANGED => StreamEvent::StateChanged {
                source,
                properties: StateProperties::from_map(&properties),
            },
            _ => StreamEvent::Unknown { kind, source },
        };

        Ok(Self {
            timestamp: record.timestamp,
            namespace: record.namespace,
            event,
        })
    }
}
