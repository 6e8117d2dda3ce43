// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events flowing from the controller to the host application.
//!
//! Raw text frames from the event stream are parsed into a
//! [`StreamRecord`] carrying a typed [`StreamEvent`]. Button presses and
//! motion are resolved to devices and fired as [`HostEvent`]s on the
//! [`EventBus`]; state changes go to the
//! [`Dispatcher`](crate::subscription::Dispatcher) instead.
//!
//! # Examples
//!
//! ```
//! use livisi_sync::event::{EventBus, HostEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.fire(HostEvent::button_pressed("d1", 0, "ShortPress"));
//! ```

mod event_bus;
mod host_event;
mod stream_event;

pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use host_event::{
    DEFAULT_PRESS_TYPE, EVENT_BUTTON_PRESSED, EVENT_MOTION_DETECTED, HostEvent, HostEventKind,
    LIVISI_EVENT,
};
pub use stream_event::{
    STREAM_BUTTON_PRESSED, STREAM_MOTION_DETECTED, STREAM_STATE_CHANGED, StateProperties,
    StreamEvent, StreamRecord,
};
