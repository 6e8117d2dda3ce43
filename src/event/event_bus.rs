// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for firing host-level device events.

use tokio::sync::broadcast;

use super::HostEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus broadcasting [`HostEvent`]s to every subscriber.
///
/// Events are fire-and-forget: publishing never waits for subscribers and
/// nothing is acknowledged. A subscriber that falls more than `capacity`
/// events behind receives `RecvError::Lagged` and loses the oldest events.
///
/// # Examples
///
/// ```
/// use livisi_sync::event::{EventBus, HostEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.fire(HostEvent::motion_detected("d1"));
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.device_id, "d1");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HostEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to host events.
    ///
    /// The receiver gets every event fired after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Fires an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it; an event fired
    /// without subscribers is discarded.
    pub fn fire(&self, event: HostEvent) -> usize {
        tracing::debug!(
            device_id = %event.device_id,
            event_type = event.event_type(),
            "Firing host event"
        );
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
