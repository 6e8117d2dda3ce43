// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `livisi_sync` - Keep a local view of a LIVISI smart home in sync.
//!
//! This library mirrors the devices of a LIVISI smart home controller
//! (SHC 1 "Classic" or SHC 2 "Avatar") through two complementary channels:
//! periodic full polling of the REST API and a persistent event WebSocket.
//!
//! # Features
//!
//! - **Polling**: Device snapshot and capability index replaced wholesale
//!   every cycle, with transparent access token refresh
//! - **Event stream**: Automatic reconnect with bounded exponential backoff;
//!   known devices are marked unreachable while the stream is down
//! - **Notifications**: State and reachability changes published per source
//!   on a [`Dispatcher`](subscription::Dispatcher); button presses and motion
//!   fired as host events on an [`EventBus`](event::EventBus)
//! - **Rooms**: Room names resolved from device locations
//!
//! # Quick Start
//!
//! ```no_run
//! use livisi_sync::{Coordinator, CoordinatorConfig, LivisiClient};
//! use livisi_sync::subscription::{Signal, Subscribable};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> livisi_sync::Result<()> {
//!     let config = CoordinatorConfig::new("192.168.1.10", "secret");
//!     let coordinator = Coordinator::new(LivisiClient::new()?, config);
//!
//!     let controller = coordinator.setup().await?;
//!     println!("Connected to {}", controller.serial_number);
//!
//!     coordinator.load_rooms().await?;
//!     for device in coordinator.refresh().await? {
//!         coordinator.register_device(device.id.clone());
//!         println!("{} in {:?}", device.id, coordinator.get_room_name(&device));
//!
//!         for capability in &device.capabilities {
//!             coordinator.on_state_changed(capability, |signal| {
//!                 if let Signal::OnState(on) = signal {
//!                     println!("switched {}", if on { "on" } else { "off" });
//!                 }
//!             });
//!         }
//!     }
//!
//!     let mut host_events = coordinator.event_bus().subscribe();
//!     let _poller = coordinator.spawn_poller(CancellationToken::new());
//!     let _stream = coordinator.ws_connect().await?;
//!
//!     while let Ok(event) = host_events.recv().await {
//!         println!("{}: {}", event.device_id, event.event_type());
//!     }
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod event;
pub mod protocol;
pub mod subscription;
pub mod types;

pub use coordinator::{
    Coordinator, CoordinatorConfig, DeviceSnapshot, PollerHandle, ReconnectionPolicy,
    StreamHandle, StreamState,
};
pub use error::{Error, ParseError, ProtocolError, Result};
pub use event::{EventBus, HostEvent, HostEventKind, StreamEvent, StreamRecord};
pub use protocol::{ConnectionData, ControllerApi};
#[cfg(feature = "client")]
pub use protocol::{HttpConfig, LivisiClient};
pub use subscription::{Dispatcher, Signal, Subscribable, SubscriptionId};
pub use types::{ControllerDescriptor, ControllerType, Device, Room};
