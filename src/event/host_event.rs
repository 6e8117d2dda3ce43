// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-level device events.

use serde::{Deserialize, Serialize};

/// Topic name under which host events are fired.
pub const LIVISI_EVENT: &str = "livisi_event";

/// `type` value of button press events.
pub const EVENT_BUTTON_PRESSED: &str = "button_pressed";

/// `type` value of motion events.
pub const EVENT_MOTION_DETECTED: &str = "motion_detected";

/// Press type assumed when the controller does not report one.
pub const DEFAULT_PRESS_TYPE: &str = "ShortPress";

/// A one-shot event about a device, fired on the [`EventBus`](super::EventBus).
///
/// Serializes to the flat shape consumed by automations:
///
/// ```
/// use livisi_sync::event::HostEvent;
///
/// let event = HostEvent::button_pressed("d1", 2, "LongPress");
///
/// assert_eq!(
///     serde_json::to_value(&event).unwrap(),
///     serde_json::json!({
///         "device_id": "d1",
///         "type": "button_pressed",
///         "button_index": 2,
///         "press_type": "LongPress"
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEvent {
    /// Device the event belongs to.
    pub device_id: String,
    /// What happened.
    #[serde(flatten)]
    pub kind: HostEventKind,
}

/// Kind-specific part of a [`HostEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEventKind {
    /// A button on the device was pressed.
    ButtonPressed {
        /// Zero-based button index.
        button_index: u32,
        /// Vendor press type, e.g. `ShortPress` or `LongPress`.
        press_type: String,
    },
    /// The device detected motion.
    MotionDetected,
}

impl HostEvent {
    /// Creates a button press event.
    #[must_use]
    pub fn button_pressed(
        device_id: impl Into<String>,
        button_index: u32,
        press_type: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            kind: HostEventKind::ButtonPressed {
                button_index,
                press_type: press_type.into(),
            },
        }
    }

    /// Creates a motion event.
    #[must_use]
    pub fn motion_detected(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: HostEventKind::MotionDetected,
        }
    }

    /// Returns the `type` string of this event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            HostEventKind::ButtonPressed { .. } => EVENT_BUTTON_PRESSED,
            HostEventKind::MotionDetected => EVENT_MOTION_DETECTED,
        }
    }
}
