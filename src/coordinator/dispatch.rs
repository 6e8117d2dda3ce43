// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dispatch of stream events to the host bus and the dispatcher.

use crate::event::{DEFAULT_PRESS_TYPE, HostEvent, StreamEvent, StreamRecord};
use crate::protocol::ControllerApi;
use crate::subscription::{LIVISI_REACHABILITY_CHANGE, LIVISI_STATE_CHANGE, Signal, topic};

use super::Coordinator;

impl<C: ControllerApi> Coordinator<C> {
    /// Parses a raw stream record and dispatches it.
    ///
    /// Records that are not JSON or lack `type` or `source` are dropped.
    pub fn handle_raw(&self, raw: &str) {
        match StreamRecord::parse(raw) {
            Ok(record) => self.handle_event(&record.event),
            Err(e) => tracing::debug!(error = %e, raw, "Dropping malformed stream record"),
        }
    }

    /// Dispatches one stream event.
    ///
    /// Button presses and motion are resolved to their device through the
    /// capability index and fired on the event bus; events from capabilities
    /// the index does not know are dropped. State changes are published per
    /// populated field under the source id, without resolution.
    pub fn handle_event(&self, event: &StreamEvent) {
        match event {
            StreamEvent::ButtonPressed {
                source,
                index,
                press_type,
            } => {
                let Some(device_id) = self.resolve(source) else {
                    return;
                };
                self.inner.event_bus.fire(HostEvent::button_pressed(
                    device_id,
                    index.unwrap_or(0),
                    press_type.as_deref().unwrap_or(DEFAULT_PRESS_TYPE),
                ));
            }
            StreamEvent::MotionDetected { source } => {
                let Some(device_id) = self.resolve(source) else {
                    return;
                };
                self.inner.event_bus.fire(HostEvent::motion_detected(device_id));
            }
            StreamEvent::StateChanged { source, properties } => {
                let state_topic = topic(LIVISI_STATE_CHANGE, source);
                for signal in properties.state_signals() {
                    self.inner.dispatcher.publish(&state_topic, signal);
                }
                if let Some(signal) = properties.reachability() {
                    self.inner
                        .dispatcher
                        .publish(&topic(LIVISI_REACHABILITY_CHANGE, source), signal);
                }
            }
            StreamEvent::Unknown { kind, source } => {
                tracing::debug!(kind = %kind, source = %source, "Ignoring unhandled stream event");
            }
        }
    }

    /// Publishes "unreachable" for every known device.
    pub(super) fn broadcast_unreachable(&self) {
        let ids = self.inner.known_devices.snapshot();
        tracing::debug!(devices = ids.len(), "Marking known devices unreachable");

        for device_id in &ids {
            self.inner.dispatcher.publish(
                &topic(LIVISI_REACHABILITY_CHANGE, device_id),
                Signal::Reachable(false),
            );
        }
    }

    fn resolve(&self, capability: &str) -> Option<String> {
        let snapshot = self.inner.snapshot.borrow();
        let device_id = snapshot.device_for_capability(capability).map(ToString::to_string);
        if device_id.is_none() {
            tracing::debug!(source = %capability, "Dropping event from unknown capability");
        }
        device_id
    }
}
