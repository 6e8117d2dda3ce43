// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Records exchanged with the LIVISI controller.
//!
//! - [`Device`] - A device with its capability ids and room
//! - [`Room`] - A room (location) with its display name
//! - [`ControllerInfo`] / [`ControllerDescriptor`] - Controller metadata
//! - [`CapabilityState`] - The state object of a single capability

mod capability;
mod controller;
mod device;
mod room;

pub use capability::{CapabilityState, StateEntry};
pub use controller::{
    AVATAR_PORT, CLASSIC_PORT, ControllerDescriptor, ControllerInfo, ControllerType,
};
pub use device::{Device, DeviceSettings};
pub use room::{Room, RoomConfig};
