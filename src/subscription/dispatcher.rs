// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic-keyed dispatcher for state and reachability notifications.
//!
//! This module provides the core types for local fan-out:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`Signal`] - The payload delivered to subscribers
//! - [`Dispatcher`] - Registry storing callbacks per topic and dispatching to them

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Topic prefix for state change notifications.
pub const LIVISI_STATE_CHANGE: &str = "livisi_state_change";

/// Topic prefix for reachability change notifications.
pub const LIVISI_REACHABILITY_CHANGE: &str = "livisi_reachability_change";

/// Builds the dispatcher topic for `kind` published by `source`.
///
/// # Examples
///
/// ```
/// use livisi_sync::subscription::{topic, LIVISI_STATE_CHANGE};
///
/// assert_eq!(
///     topic(LIVISI_STATE_CHANGE, "/capability/c1"),
///     "livisi_state_change_/capability/c1"
/// );
/// ```
#[must_use]
pub fn topic(kind: &str, source: &str) -> String {
    format!("{kind}_{source}")
}

/// Unique identifier for a subscription.
///
/// Returned when connecting a callback and used to disconnect it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// A value published on a dispatcher topic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Switch or actuator on/off state.
    OnState(bool),
    /// Climate control reading (set point, measured temperature or humidity).
    Climate(f64),
    /// Window/door contact state.
    IsOpen(bool),
    /// Luminance reading.
    Luminance(f64),
    /// Whether the source is reachable.
    Reachable(bool),
}

type SignalCallback = Arc<dyn Fn(Signal) + Send + Sync>;

/// Publish/subscribe sink keyed by string topic.
///
/// Topics have the form `<event-kind>_<source-id>` (see [`topic`]). Every
/// publish is delivered synchronously to every callback currently connected
/// to that topic.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use livisi_sync::subscription::{Dispatcher, Signal};
///
/// let dispatcher = Dispatcher::new();
/// let seen = Arc::new(AtomicBool::new(false));
///
/// let flag = Arc::clone(&seen);
/// let id = dispatcher.connect("livisi_state_change_c1", move |signal| {
///     flag.store(signal == Signal::OnState(true), Ordering::SeqCst);
/// });
///
/// dispatcher.publish("livisi_state_change_c1", Signal::OnState(true));
/// assert!(seen.load(Ordering::SeqCst));
///
/// assert!(dispatcher.disconnect(id));
/// ```
pub struct Dispatcher {
    next_id: AtomicU64,
    topics: RwLock<HashMap<String, HashMap<SubscriptionId, SignalCallback>>>,
}

impl Dispatcher {
    /// Creates a dispatcher without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            topics: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Connects a callback to `topic`.
    pub fn connect<F>(&self, topic: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.topics
            .write()
            .entry(topic.into())
            .or_default()
            .insert(id, Arc::new(callback));
        id
    }

    /// Disconnects a callback.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut topics = self.topics.write();
        let Some(topic) = topics
            .iter()
            .find_map(|(topic, callbacks)| callbacks.contains_key(&id).then(|| topic.clone()))
        else {
            return false;
        };

        if let Some(callbacks) = topics.get_mut(&topic) {
            callbacks.remove(&id);
            if callbacks.is_empty() {
                topics.remove(&topic);
            }
        }
        true
    }

    /// Publishes `signal` to every callback connected to `topic`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, topic: &str, signal: Signal) -> usize {
        // Clone out of the lock so callbacks may (dis)connect.
        let callbacks: Vec<SignalCallback> = self
            .topics
            .read()
            .get(topic)
            .map(|callbacks| callbacks.values().cloned().collect())
            .unwrap_or_default();

        tracing::trace!(topic, ?signal, subscribers = callbacks.len(), "Publishing signal");

        for callback in &callbacks {
            callback(signal);
        }
        callbacks.len()
    }

    /// Returns the number of callbacks connected to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, HashMap::len)
    }

    /// Removes every callback.
    pub fn clear(&self) {
        self.topics.write().clear();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("topics", &self.topics.read().len())
            .finish_non_exhaustive()
    }
}
