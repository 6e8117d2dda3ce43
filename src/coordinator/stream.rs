// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event stream lifecycle: connect, receive, reconnect on close.

use std::fmt;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::protocol::ControllerApi;

use super::Coordinator;

/// Connection state of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// No stream task is running.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Records are being received.
    Connected,
    /// The connection closed; a reconnect follows.
    Closed,
}

impl StreamState {
    /// Returns `true` if records are being received.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Handle to a running event stream task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](Self::shutdown).
#[derive(Debug, Clone)]
pub struct StreamHandle {
    cancel: CancellationToken,
    state: watch::Receiver<StreamState>,
}

impl StreamHandle {
    /// Returns the current stream state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Returns a receiver notified on every state transition.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Returns `true` until the task has been told to stop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stops the stream task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl<C: ControllerApi + 'static> Coordinator<C> {
    /// Opens the event stream and keeps it open.
    ///
    /// Resolves once the first connection is established. A background task
    /// then dispatches every record and, when the connection closes, marks
    /// all known devices unreachable before reconnecting on the same port.
    /// Calling this while a stream task runs, or while another call is still
    /// connecting, returns the handle of that stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] before [`setup`](Self::setup), or the
    /// error of the first connection attempt.
    pub async fn ws_connect(&self) -> Result<StreamHandle> {
        // Held until the first connection resolves; concurrent callers queue
        // here and then reuse the stream this call started.
        let mut slot = self.inner.stream.lock().await;
        if let Some(handle) = slot.as_ref().filter(|handle| handle.is_running()) {
            return Ok(handle.clone());
        }

        let port = self.controller().ok_or(Error::NotConfigured)?.port;

        self.set_stream_state(StreamState::Connecting);
        let rx = match self.inner.client.open_event_stream(port).await {
            Ok(rx) => rx,
            Err(e) => {
                self.set_stream_state(StreamState::Disconnected);
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let handle = StreamHandle {
            cancel: cancel.clone(),
            state: self.inner.stream_state.subscribe(),
        };
        *slot = Some(handle.clone());

        self.set_stream_state(StreamState::Connected);
        tracing::info!(port, "Event stream connected");

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_stream(rx, port, cancel).await;
        });

        Ok(handle)
    }

    /// Returns the current stream state.
    #[must_use]
    pub fn stream_state(&self) -> StreamState {
        *self.inner.stream_state.borrow()
    }

    fn set_stream_state(&self, state: StreamState) {
        self.inner.stream_state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    async fn run_stream(&self, mut rx: mpsc::Receiver<String>, port: u16, cancel: CancellationToken) {
        loop {
            let Some(delivered) = self.receive(&mut rx, &cancel).await else {
                break;
            };

            self.set_stream_state(StreamState::Closed);
            tracing::info!(port, delivered, "Event stream closed");
            self.broadcast_unreachable();

            match self.reconnect(port, delivered > 0, &cancel).await {
                Some(next) => rx = next,
                None => break,
            }
        }

        cancel.cancel();
        self.set_stream_state(StreamState::Disconnected);
        tracing::debug!(port, "Event stream task stopped");
    }

    /// Dispatches records until the connection closes.
    ///
    /// Returns the number of records received, or `None` if cancelled.
    async fn receive(&self, rx: &mut mpsc::Receiver<String>, cancel: &CancellationToken) -> Option<usize> {
        let mut delivered = 0;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                frame = rx.recv() => match frame {
                    Some(raw) => {
                        delivered += 1;
                        self.handle_raw(&raw);
                    }
                    None => return Some(delivered),
                },
            }
        }
    }

    /// Reopens the stream on `port`.
    ///
    /// The first attempt is immediate if the closed connection was healthy;
    /// every other attempt waits according to the reconnection policy.
    /// Returns `None` if cancelled or the policy gives up.
    async fn reconnect(
        &self,
        port: u16,
        healthy: bool,
        cancel: &CancellationToken,
    ) -> Option<mpsc::Receiver<String>> {
        let policy = &self.inner.config.reconnection;
        if !policy.enabled {
            tracing::info!("Event stream reconnection disabled");
            return None;
        }

        let mut attempt: u32 = u32::from(!healthy);
        loop {
            if attempt > 0 {
                if !policy.should_retry(attempt - 1) {
                    tracing::error!(attempt, "Event stream reconnection limit reached, giving up");
                    return None;
                }

                let delay = policy.delay_for_attempt(attempt - 1);
                tracing::warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Waiting before event stream reconnect"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return None,
                    () = tokio::time::sleep(delay) => {}
                }
            }

            self.set_stream_state(StreamState::Connecting);
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                result = self.inner.client.open_event_stream(port) => result,
            };

            match result {
                Ok(rx) => {
                    self.set_stream_state(StreamState::Connected);
                    tracing::info!(port, attempt, "Event stream reconnected");
                    return Some(rx);
                }
                Err(e) => {
                    tracing::warn!(error = %e, port, attempt, "Event stream reconnect failed");
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
