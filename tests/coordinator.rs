// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the coordinator against an in-memory controller.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use livisi_sync::coordinator::{Coordinator, CoordinatorConfig, ReconnectionPolicy, StreamState};
use livisi_sync::error::{Error, ProtocolError, Result};
use livisi_sync::event::HostEventKind;
use livisi_sync::protocol::{ConnectionData, ControllerApi};
use livisi_sync::subscription::{Signal, Subscribable};
use livisi_sync::types::{CapabilityState, ControllerInfo, Device, Room};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fake controller
// ============================================================================

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct FakeState {
    session: Option<ConnectionData>,
    controller_type: String,
    devices: Vec<Device>,
    rooms: Vec<Room>,
    states: HashMap<String, CapabilityState>,
    device_errors: VecDeque<Error>,
    token_error: Option<Error>,
    controller_error: Option<Error>,
    streams: VecDeque<mpsc::Receiver<String>>,
    /// Scheduler yields before each `open_event_stream` resolves.
    open_yields: VecDeque<usize>,
}

/// In-memory controller recording every call in a shared log.
struct FakeController {
    state: Mutex<FakeState>,
    log: Log,
}

impl FakeController {
    fn new(log: &Log) -> Self {
        Self {
            state: Mutex::new(FakeState {
                controller_type: "Avatar".to_string(),
                ..FakeState::default()
            }),
            log: Arc::clone(log),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().push(call.into());
    }

    fn set_devices(&self, devices: Vec<Device>) {
        self.state.lock().devices = devices;
    }

    fn fail_devices(&self, error: Error) {
        self.state.lock().device_errors.push_back(error);
    }

    /// Queues a stream connection and returns its sending side.
    fn queue_stream(&self) -> mpsc::Sender<String> {
        let (tx, rx) = mpsc::channel(16);
        self.state.lock().streams.push_back(rx);
        tx
    }
}

impl ControllerApi for FakeController {
    async fn set_token(&self, connection: &ConnectionData) -> Result<()> {
        self.record("set_token");
        let mut state = self.state.lock();
        if let Some(error) = state.token_error.take() {
            return Err(error);
        }
        state.session = Some(connection.clone());
        Ok(())
    }

    fn connection_data(&self) -> Option<ConnectionData> {
        self.state.lock().session.clone()
    }

    async fn get_controller(&self) -> Result<ControllerInfo> {
        self.record("get_controller");
        let mut state = self.state.lock();
        if let Some(error) = state.controller_error.take() {
            return Err(error);
        }
        Ok(ControllerInfo::new(state.controller_type.as_str(), "SN-1"))
    }

    async fn get_devices(&self) -> Result<Vec<Device>> {
        self.record("get_devices");
        let mut state = self.state.lock();
        if let Some(error) = state.device_errors.pop_front() {
            return Err(error);
        }
        Ok(state.devices.clone())
    }

    async fn get_device_state(&self, capability: &str) -> Result<Option<CapabilityState>> {
        self.record(format!("get_device_state:{capability}"));
        Ok(self.state.lock().states.get(capability).cloned())
    }

    async fn get_all_rooms(&self) -> Result<Vec<Room>> {
        self.record("get_all_rooms");
        Ok(self.state.lock().rooms.clone())
    }

    async fn open_event_stream(&self, port: u16) -> Result<mpsc::Receiver<String>> {
        self.record(format!("open_event_stream:{port}"));
        let yields = self.state.lock().open_yields.pop_front().unwrap_or(0);
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        self.state
            .lock()
            .streams
            .pop_front()
            .ok_or_else(|| ProtocolError::WebSocket("connection refused".to_string()).into())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn coordinator(log: &Log) -> Coordinator<FakeController> {
    coordinator_with(log, CoordinatorConfig::new("shc.local", "secret"))
}

fn coordinator_with(log: &Log, config: CoordinatorConfig) -> Coordinator<FakeController> {
    Coordinator::new(FakeController::new(log), config)
}

fn calls(log: &Log) -> Vec<String> {
    log.lock().clone()
}

fn count(log: &Log, call: &str) -> usize {
    log.lock().iter().filter(|entry| entry.as_str() == call).count()
}

/// Waits until `condition` holds, failing after five (virtual) seconds.
async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn connected(log: &Log) -> Coordinator<FakeController> {
    let coordinator = coordinator(log);
    coordinator.setup().await.unwrap();
    coordinator
}

// ============================================================================
// Setup
// ============================================================================

mod setup {
    use super::*;

    #[tokio::test]
    async fn authenticates_when_no_session_is_cached() {
        let log = Log::default();
        let coordinator = coordinator(&log);

        let descriptor = coordinator.setup().await.unwrap();

        assert_eq!(calls(&log), vec!["set_token", "get_controller"]);
        assert_eq!(descriptor.serial_number, "SN-1");
        assert_eq!(descriptor.port, 9090);
        assert!(descriptor.is_avatar);
        assert_eq!(coordinator.controller(), Some(descriptor));
        assert_eq!(
            coordinator.client().connection_data(),
            Some(ConnectionData::new("shc.local", "secret"))
        );
    }

    #[tokio::test]
    async fn reuses_cached_session() {
        let log = Log::default();
        let coordinator = coordinator(&log);
        coordinator.client().state.lock().session = Some(ConnectionData::new("shc.local", "x"));
        coordinator.client().state.lock().controller_type = "Classic".to_string();

        let descriptor = coordinator.setup().await.unwrap();

        assert_eq!(calls(&log), vec!["get_controller"]);
        assert_eq!(descriptor.port, 8080);
        assert!(!descriptor.is_avatar);
    }

    #[tokio::test]
    async fn unknown_controller_type_uses_classic_port() {
        let log = Log::default();
        let coordinator = coordinator(&log);
        coordinator.client().state.lock().controller_type = "SHC3".to_string();

        let descriptor = coordinator.setup().await.unwrap();

        assert_eq!(descriptor.port, 8080);
        assert!(!descriptor.is_avatar);
    }

    #[tokio::test]
    async fn failures_propagate_without_retry() {
        let log = Log::default();
        let coordinator = coordinator(&log);
        coordinator.client().state.lock().token_error = Some(Error::InvalidCredentials);

        assert!(matches!(coordinator.setup().await, Err(Error::InvalidCredentials)));
        assert_eq!(calls(&log), vec!["set_token"]);
        assert!(coordinator.controller().is_none());
    }

    #[tokio::test]
    async fn zero_event_capacity_does_not_panic() {
        let log = Log::default();
        let mut config = CoordinatorConfig::new("shc.local", "secret");
        config.event_capacity = 0;

        let coordinator = coordinator_with(&log, config);

        assert_eq!(coordinator.event_bus().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn metadata_failure_propagates() {
        let log = Log::default();
        let coordinator = coordinator(&log);
        coordinator.client().state.lock().controller_error =
            Some(ProtocolError::ConnectionFailed("down".to_string()).into());

        assert!(matches!(coordinator.setup().await, Err(Error::Protocol(_))));
        assert!(coordinator.controller().is_none());
    }
}

// ============================================================================
// Poll cycle
// ============================================================================

mod poll {
    use super::*;

    #[tokio::test]
    async fn refresh_rebuilds_index_from_scratch() {
        let log = Log::default();
        let coordinator = connected(&log).await;

        coordinator.client().set_devices(vec![
            Device::new("d1", ["c1", "c2"]),
            Device::new("d2", ["c3"]),
        ]);
        coordinator.refresh().await.unwrap();

        coordinator.client().set_devices(vec![Device::new("d2", ["c3", "c4"])]);
        let devices = coordinator.refresh().await.unwrap();

        let snapshot = coordinator.snapshot();
        let mut keys: Vec<&String> = snapshot.capability_index().keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["c3", "c4"]);
        assert_eq!(snapshot.device_for_capability("c1"), None);
        assert_eq!(devices, coordinator.devices());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once_and_retried_once() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        log.lock().clear();

        coordinator.client().set_devices(vec![Device::new("d1", ["c1"])]);
        coordinator.client().fail_devices(Error::TokenExpired);

        let devices = coordinator.refresh().await.unwrap();

        assert_eq!(calls(&log), vec!["get_devices", "set_token", "get_devices"]);
        assert_eq!(devices.len(), 1);
        assert!(coordinator.last_update_success());
    }

    #[tokio::test]
    async fn second_expiry_fails_the_cycle() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.client().set_devices(vec![Device::new("d1", ["c1"])]);
        coordinator.refresh().await.unwrap();
        log.lock().clear();

        coordinator.client().fail_devices(Error::TokenExpired);
        coordinator.client().fail_devices(Error::TokenExpired);

        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, Error::UpdateFailed { .. }));
        assert_eq!(calls(&log), vec!["get_devices", "set_token", "get_devices"]);
        assert!(!coordinator.last_update_success());
        // The previous snapshot survives.
        assert_eq!(coordinator.snapshot().device_for_capability("c1"), Some("d1"));
    }

    #[tokio::test]
    async fn failed_token_refresh_fails_the_cycle() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        log.lock().clear();

        coordinator.client().fail_devices(Error::TokenExpired);
        coordinator.client().state.lock().token_error = Some(Error::InvalidCredentials);

        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, Error::UpdateFailed { .. }));
        assert_eq!(calls(&log), vec!["get_devices", "set_token"]);
    }

    #[tokio::test]
    async fn connectivity_error_is_update_failure() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        log.lock().clear();

        coordinator
            .client()
            .fail_devices(ProtocolError::ConnectionFailed("unreachable".to_string()).into());

        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, Error::UpdateFailed { .. }));
        assert_eq!(calls(&log), vec!["get_devices"]);
        assert!(!coordinator.last_update_success());
    }

    #[tokio::test]
    async fn other_errors_propagate_unchanged() {
        let log = Log::default();
        let coordinator = connected(&log).await;

        coordinator.client().fail_devices(Error::Controller {
            code: 1000,
            message: "boom".to_string(),
        });

        assert!(matches!(
            coordinator.refresh().await,
            Err(Error::Controller { code: 1000, .. })
        ));
    }

    #[tokio::test]
    async fn successful_refresh_clears_failure_flag() {
        let log = Log::default();
        let coordinator = connected(&log).await;

        coordinator
            .client()
            .fail_devices(ProtocolError::Timeout(10_000).into());
        assert!(coordinator.refresh().await.is_err());
        assert!(!coordinator.last_update_success());

        coordinator.refresh().await.unwrap();
        assert!(coordinator.last_update_success());
    }

    #[tokio::test(start_paused = true)]
    async fn poller_runs_every_interval() {
        let log = Log::default();
        let config =
            CoordinatorConfig::new("shc.local", "secret").with_poll_interval(Duration::from_secs(60));
        let coordinator = coordinator_with(&log, config);
        coordinator.client().set_devices(vec![Device::new("d1", ["c1"])]);
        let mut updates = coordinator.subscribe_devices();

        let poller = coordinator.spawn_poller(CancellationToken::new());

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().device_for_capability("c1"), Some("d1"));

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(count(&log, "get_devices"), 3);

        poller.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count(&log, "get_devices"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_parent_token_stops_poller() {
        let log = Log::default();
        let coordinator = coordinator(&log);
        let cancel = CancellationToken::new();

        let poller = coordinator.spawn_poller(cancel.clone());
        eventually(|| count(&log, "get_devices") == 1).await;

        cancel.cancel();
        eventually(|| poller.is_finished()).await;
    }
}

// ============================================================================
// Queries
// ============================================================================

mod queries {
    use super::*;

    #[tokio::test]
    async fn device_state_strips_one_leading_character() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.client().state.lock().states.insert(
            "capability/c1".to_string(),
            CapabilityState::new().with_value("onState", true),
        );

        let value = coordinator
            .get_device_state("/capability/c1", "onState")
            .await
            .unwrap();

        assert_eq!(value, Some(json!(true)));
        assert!(calls(&log).contains(&"get_device_state:capability/c1".to_string()));
    }

    #[tokio::test]
    async fn missing_key_or_state_is_none() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.client().state.lock().states.insert(
            "capability/c1".to_string(),
            CapabilityState::new().with_value("onState", false),
        );

        assert_eq!(
            coordinator.get_device_state("/capability/c1", "luminance").await.unwrap(),
            None
        );
        assert_eq!(
            coordinator.get_device_state("/capability/c9", "onState").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn room_names_resolve_from_location() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.client().state.lock().rooms =
            vec![Room::new("r1", "Kitchen"), Room::new("r2", "Hall")];

        coordinator.load_rooms().await.unwrap();

        let kitchen = Device::new("d1", ["c1"]).with_location("r1");
        assert_eq!(coordinator.get_room_name(&kitchen).as_deref(), Some("Kitchen"));
        assert_eq!(coordinator.get_room_name(&kitchen).as_deref(), Some("Kitchen"));

        assert_eq!(coordinator.get_room_name(&Device::new("d2", ["c2"])), None);
        assert_eq!(
            coordinator.get_room_name(&Device::new("d3", ["c3"]).with_location("r9")),
            None
        );
    }

    #[tokio::test]
    async fn register_and_unregister_devices() {
        let log = Log::default();
        let coordinator = coordinator(&log);

        assert!(coordinator.register_device("d2"));
        assert!(coordinator.register_device("d1"));
        assert!(!coordinator.register_device("d1"));
        assert_eq!(coordinator.known_devices(), vec!["d1", "d2"]);

        assert!(coordinator.unregister_device("d2"));
        assert_eq!(coordinator.known_devices(), vec!["d1"]);
    }
}

// ============================================================================
// Event stream
// ============================================================================

mod stream {
    use super::*;

    #[tokio::test]
    async fn ws_connect_requires_setup() {
        let log = Log::default();
        let coordinator = coordinator(&log);

        assert!(matches!(coordinator.ws_connect().await, Err(Error::NotConfigured)));
        assert_eq!(coordinator.stream_state(), StreamState::Disconnected);
    }

    #[tokio::test]
    async fn first_connect_failure_is_returned() {
        let log = Log::default();
        let coordinator = connected(&log).await;

        assert!(matches!(coordinator.ws_connect().await, Err(Error::Protocol(_))));
        assert_eq!(coordinator.stream_state(), StreamState::Disconnected);
    }

    #[tokio::test]
    async fn ws_connect_is_idempotent() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        let _tx = coordinator.client().queue_stream();

        let first = coordinator.ws_connect().await.unwrap();
        let second = coordinator.ws_connect().await.unwrap();

        assert_eq!(count(&log, "open_event_stream:9090"), 1);
        assert_eq!(first.state(), StreamState::Connected);
        assert!(second.is_running());

        first.shutdown();
        assert!(!second.is_running());
    }

    #[tokio::test]
    async fn concurrent_ws_connect_shares_first_stream() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        let _tx = coordinator.client().queue_stream();
        coordinator.client().state.lock().open_yields = VecDeque::from([1, 10]);

        let (first, second) = tokio::join!(coordinator.ws_connect(), coordinator.ws_connect());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(count(&log, "open_event_stream:9090"), 1);
        assert_eq!(coordinator.stream_state(), StreamState::Connected);
        assert_eq!(second.state(), StreamState::Connected);

        first.shutdown();
        assert!(!second.is_running());
    }

    #[tokio::test]
    async fn concurrent_ws_connect_failures_leave_stream_disconnected() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.client().state.lock().open_yields = VecDeque::from([3, 1]);

        let (first, second) = tokio::join!(coordinator.ws_connect(), coordinator.ws_connect());

        assert!(matches!(first, Err(Error::Protocol(_))));
        assert!(matches!(second, Err(Error::Protocol(_))));
        assert_eq!(count(&log, "open_event_stream:9090"), 2);
        assert_eq!(coordinator.stream_state(), StreamState::Disconnected);
    }

    #[tokio::test]
    async fn end_to_end_button_press_in_kitchen() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator
            .client()
            .set_devices(vec![Device::new("d1", ["c1"]).with_location("r1")]);
        coordinator.client().state.lock().rooms = vec![Room::new("r1", "Kitchen")];
        let tx = coordinator.client().queue_stream();

        coordinator.load_rooms().await.unwrap();
        let devices = coordinator.refresh().await.unwrap();
        let mut host_events = coordinator.event_bus().subscribe();
        let handle = coordinator.ws_connect().await.unwrap();

        tx.send(
            json!({
                "type": "ButtonPressed",
                "source": "c1",
                "properties": {"index": 0, "type": "LongPress"}
            })
            .to_string(),
        )
        .await
        .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), host_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.device_id, "d1");
        assert_eq!(event.event_type(), "button_pressed");
        assert_eq!(
            event.kind,
            HostEventKind::ButtonPressed {
                button_index: 0,
                press_type: "LongPress".to_string(),
            }
        );
        assert_eq!(coordinator.get_room_name(&devices[0]).as_deref(), Some("Kitchen"));

        handle.shutdown();
    }

    #[tokio::test]
    async fn state_change_reaches_subscribers() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        let tx = coordinator.client().queue_stream();
        let seen: Arc<Mutex<Vec<Signal>>> = Arc::default();

        let sink = Arc::clone(&seen);
        coordinator.on_state_changed("c2", move |signal| sink.lock().push(signal));

        let handle = coordinator.ws_connect().await.unwrap();
        tx.send(r#"{"type":"StateChanged","source":"c2","properties":{"luminance":42}}"#.to_string())
            .await
            .unwrap();

        eventually(|| !seen.lock().is_empty()).await;
        assert_eq!(*seen.lock(), vec![Signal::Luminance(42.0)]);

        handle.shutdown();
    }

    #[tokio::test]
    async fn unknown_capability_fires_no_host_event() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.client().set_devices(vec![Device::new("d1", ["c1"])]);
        coordinator.refresh().await.unwrap();
        let tx = coordinator.client().queue_stream();
        let mut host_events = coordinator.event_bus().subscribe();

        let handle = coordinator.ws_connect().await.unwrap();
        tx.send(r#"{"type":"ButtonPressed","source":"c9"}"#.to_string())
            .await
            .unwrap();
        tx.send(r#"{"type":"MotionDetected","source":"c1"}"#.to_string())
            .await
            .unwrap();

        // Records are handled in order, so the first event seen is the motion.
        let event = tokio::time::timeout(Duration::from_secs(5), host_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, HostEventKind::MotionDetected);
        assert!(host_events.try_recv().is_err());

        handle.shutdown();
    }

    #[tokio::test]
    async fn close_marks_known_devices_unreachable_before_reconnect() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.register_device("d1");
        coordinator.register_device("d2");
        for device_id in ["d1", "d2"] {
            let log = Arc::clone(&log);
            let id = device_id.to_string();
            coordinator.on_reachability_changed(device_id, move |reachable| {
                log.lock().push(format!("reachable:{id}:{reachable}"));
            });
        }

        let first = coordinator.client().queue_stream();
        let _second = coordinator.client().queue_stream();
        let handle = coordinator.ws_connect().await.unwrap();
        first.send(r#"{"type":"Unknown","source":"x"}"#.to_string()).await.unwrap();
        log.lock().clear();

        drop(first);
        eventually(|| count(&log, "open_event_stream:9090") == 1).await;

        assert_eq!(
            calls(&log),
            vec![
                "reachable:d1:false",
                "reachable:d2:false",
                "open_event_stream:9090",
            ]
        );
        let mut state = handle.watch_state();
        state.wait_for(|s| s.is_connected()).await.unwrap();

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_connection_reconnects_immediately() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        let first = coordinator.client().queue_stream();
        let _second = coordinator.client().queue_stream();

        let handle = coordinator.ws_connect().await.unwrap();
        first.send(r#"{"type":"MotionDetected","source":"c1"}"#.to_string()).await.unwrap();
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        drop(first);
        eventually(|| count(&log, "open_event_stream:9090") == 2).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_reconnects_back_off_until_limit() {
        let log = Log::default();
        let config = CoordinatorConfig::new("shc.local", "secret").with_reconnection(
            ReconnectionPolicy::new()
                .with_max_retries(3)
                .with_initial_delay(Duration::from_secs(1))
                .with_max_delay(Duration::from_secs(60)),
        );
        let coordinator = coordinator_with(&log, config);
        coordinator.setup().await.unwrap();
        let first = coordinator.client().queue_stream();

        let handle = coordinator.ws_connect().await.unwrap();
        let mut state = handle.watch_state();
        first.send(r#"{"type":"MotionDetected","source":"c1"}"#.to_string()).await.unwrap();
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        drop(first);
        state
            .wait_for(|s| *s == StreamState::Disconnected)
            .await
            .unwrap();

        // Immediate attempt, then 1s, 2s and 4s apart.
        assert_eq!(count(&log, "open_event_stream:9090"), 5);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(7), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(8), "elapsed {elapsed:?}");
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn connection_closing_without_records_backs_off() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        let first = coordinator.client().queue_stream();
        let _second = coordinator.client().queue_stream();

        let handle = coordinator.ws_connect().await.unwrap();
        let started = tokio::time::Instant::now();
        drop(first);
        eventually(|| count(&log, "open_event_stream:9090") == 2).await;

        assert!(started.elapsed() >= Duration::from_secs(1));
        handle.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_without_unreachable_broadcast() {
        let log = Log::default();
        let coordinator = connected(&log).await;
        coordinator.register_device("d1");
        let seen: Arc<Mutex<Vec<bool>>> = Arc::default();
        let sink = Arc::clone(&seen);
        coordinator.on_reachability_changed("d1", move |reachable| sink.lock().push(reachable));

        let _tx = coordinator.client().queue_stream();
        let handle = coordinator.ws_connect().await.unwrap();
        let mut state = handle.watch_state();

        handle.shutdown();
        state
            .wait_for(|s| *s == StreamState::Disconnected)
            .await
            .unwrap();

        assert!(seen.lock().is_empty());
        assert_eq!(count(&log, "open_event_stream:9090"), 1);
    }
}
