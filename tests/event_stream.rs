// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the event stream transport against a local
//! WebSocket server.

#![cfg(feature = "client")]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use livisi_sync::protocol::{ConnectionData, ControllerApi, HttpConfig, LivisiClient};
use livisi_sync::{Error, StreamEvent, StreamRecord};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok/en+1";

/// Authenticated client whose REST side is served by `server`.
async fn client(server: &MockServer) -> LivisiClient {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": TOKEN})))
        .mount(server)
        .await;

    let client = HttpConfig::new()
        .with_port(server.address().port())
        .into_client()
        .unwrap();
    client
        .set_token(&ConnectionData::new("127.0.0.1", "secret"))
        .await
        .unwrap();
    client
}

/// Accepts one WebSocket session, sends `frames`, then closes it.
///
/// Returns the port and the request URI seen during the handshake.
async fn serve_once(frames: Vec<Message>) -> (u16, Arc<Mutex<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let uri = Arc::new(Mutex::new(String::new()));
    let capture = Arc::clone(&uri);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_hdr_async(
            stream,
            move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                *capture.lock() = request.uri().to_string();
                Ok(response)
            },
        )
        .await
        .unwrap();

        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        let _ = ws.close(None).await;
    });

    (port, uri)
}

async fn next_frame(rx: &mut tokio::sync::mpsc::Receiver<String>) -> Option<String> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no frame in time")
}

#[tokio::test]
async fn text_frames_are_forwarded_in_order() {
    let server = MockServer::start().await;
    let client = client(&server).await;
    let (port, uri) = serve_once(vec![
        Message::text(r#"{"type":"MotionDetected","source":"/capability/c1"}"#),
        Message::Ping(b"hb".to_vec().into()),
        Message::text(r#"{"type":"StateChanged","source":"c2","properties":{"onState":true}}"#),
    ])
    .await;

    let mut rx = client.open_event_stream(port).await.unwrap();

    let first = StreamRecord::parse(&next_frame(&mut rx).await.unwrap()).unwrap();
    assert_eq!(
        first.event,
        StreamEvent::MotionDetected {
            source: "/capability/c1".to_string()
        }
    );
    let second = StreamRecord::parse(&next_frame(&mut rx).await.unwrap()).unwrap();
    assert_eq!(second.event.source(), "c2");

    // Close frame ends the channel.
    assert_eq!(next_frame(&mut rx).await, None);
    assert_eq!(*uri.lock(), "/events?token=tok%2Fen%2B1");
}

#[tokio::test]
async fn immediate_close_ends_channel() {
    let server = MockServer::start().await;
    let client = client(&server).await;
    let (port, _) = serve_once(Vec::new()).await;

    let mut rx = client.open_event_stream(port).await.unwrap();

    assert_eq!(next_frame(&mut rx).await, None);
}

#[tokio::test]
async fn server_close_is_acknowledged() {
    let server = MockServer::start().await;
    let client = client(&server).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        let _ = reply_tx.send(ws.next().await);
    });

    let mut rx = client.open_event_stream(port).await.unwrap();
    assert_eq!(next_frame(&mut rx).await, None);

    let reply = tokio::time::timeout(Duration::from_secs(5), reply_rx)
        .await
        .expect("server saw nothing in time")
        .unwrap();
    assert!(matches!(reply, Some(Ok(Message::Close(_)))));
}

#[tokio::test]
async fn refused_connection_is_connectivity_error() {
    let server = MockServer::start().await;
    let client = client(&server).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = client.open_event_stream(port).await.unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn stream_requires_session() {
    let client = LivisiClient::new().unwrap();

    assert!(matches!(
        client.open_event_stream(9090).await,
        Err(Error::NotConfigured)
    ));
}
