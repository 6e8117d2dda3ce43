// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-interval poll scheduler.

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::protocol::ControllerApi;

use super::Coordinator;

/// Handle to a running poll task.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stops the poll task after the current cycle.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task and waits for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Poll task ended abnormally");
        }
    }
}

impl<C: ControllerApi + 'static> Coordinator<C> {
    /// Spawns a task running [`refresh`](Self::refresh) every poll interval.
    ///
    /// The task stops when `cancel` (or the returned handle) is cancelled.
    /// The first cycle runs immediately. A slow cycle delays the next tick
    /// instead of bursting. Failures are logged and tracked in
    /// [`last_update_success`](Self::last_update_success); new snapshots are
    /// visible through [`subscribe_devices`](Self::subscribe_devices).
    #[must_use]
    pub fn spawn_poller(&self, cancel: CancellationToken) -> PollerHandle {
        let cancel = cancel.child_token();
        let coordinator = self.clone();
        let period = self.inner.config.poll_interval;
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(interval_s = period.as_secs(), "Poller started");
            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Errors are logged by refresh.
                        let _ = coordinator.refresh().await;
                    }
                }
            }
            tracing::debug!("Poller stopped");
        });

        PollerHandle { cancel, task }
    }
}
