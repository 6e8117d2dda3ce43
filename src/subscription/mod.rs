// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local notification sink for state and reachability changes.
//!
//! The coordinator publishes every populated field of a `StateChanged`
//! stream event to a topic of the form `<event-kind>_<source-id>`; entities
//! connect callbacks to the topics they care about.
//!
//! - [`Dispatcher`] - Topic-keyed callback registry
//! - [`Signal`] - The payload published on a topic
//! - [`Subscribable`] - Per-source subscription helpers
//!
//! # Usage
//!
//! ```
//! use livisi_sync::subscription::{Dispatcher, Subscribable};
//!
//! let dispatcher = Dispatcher::new();
//!
//! let sub_id = dispatcher.on_reachability_changed("d1", |reachable| {
//!     println!("d1 reachable: {reachable}");
//! });
//!
//! dispatcher.unsubscribe(sub_id);
//! ```

mod dispatcher;
mod subscribable;

pub use dispatcher::{
    Dispatcher, LIVISI_REACHABILITY_CHANGE, LIVISI_STATE_CHANGE, Signal, SubscriptionId, topic,
};
pub use subscribable::Subscribable;
