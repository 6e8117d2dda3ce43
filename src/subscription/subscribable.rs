// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for entities listening to a single source.

use crate::subscription::{
    Dispatcher, LIVISI_REACHABILITY_CHANGE, LIVISI_STATE_CHANGE, Signal, SubscriptionId, topic,
};

/// Trait for types that hand out per-source notifications.
///
/// A source is a capability id for state changes, and either a capability id
/// or a device id for reachability changes (device ids are used when the
/// event stream drops).
///
/// # Examples
///
/// ```
/// use livisi_sync::subscription::{Dispatcher, Signal, Subscribable};
///
/// let dispatcher = Dispatcher::new();
/// let sub_id = dispatcher.on_state_changed("/capability/c1", |signal| {
///     if let Signal::OnState(on) = signal {
///         println!("switch is now {}", if on { "on" } else { "off" });
///     }
/// });
///
/// dispatcher.unsubscribe(sub_id);
/// ```
pub trait Subscribable {
    /// Subscribes to state changes published by `source`.
    fn on_state_changed<F>(&self, source: &str, callback: F) -> SubscriptionId
    where
        F: Fn(Signal) + Send + Sync + 'static;

    /// Subscribes to reachability changes of `source`.
    ///
    /// The callback receives the new reachability flag.
    fn on_reachability_changed<F>(&self, source: &str, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl Subscribable for Dispatcher {
    fn on_state_changed<F>(&self, source: &str, callback: F) -> SubscriptionId
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        self.connect(topic(LIVISI_STATE_CHANGE, source), callback)
    }

    fn on_reachability_changed<F>(&self, source: &str, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.connect(topic(LIVISI_REACHABILITY_CHANGE, source), move |signal| {
            if let Signal::Reachable(reachable) = signal {
                callback(reachable);
            }
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.disconnect(id)
    }
}
