// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event stream transport.
//!
//! A connection is one WebSocket session. Text frames are forwarded into an
//! mpsc channel by a reader task; the channel closes when the session ends,
//! which is how the coordinator learns about disconnects.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ProtocolError;

/// Buffered frames per connection before the reader applies backpressure.
const FRAME_BUFFER: usize = 256;

/// Builds the event stream URL for `host` and `port`.
///
/// # Examples
///
/// ```
/// use livisi_sync::protocol::event_stream_url;
///
/// assert_eq!(
///     event_stream_url("192.168.1.10", 9090, "a+b/c"),
///     "ws://192.168.1.10:9090/events?token=a%2Bb%2Fc"
/// );
/// ```
#[must_use]
pub fn event_stream_url(host: &str, port: u16, token: &str) -> String {
    format!(
        "ws://{host}:{port}/events?token={}",
        urlencoding::encode(token)
    )
}

/// Opens a WebSocket session to `url` and spawns its reader.
///
/// Resolves once the handshake completed. The returned receiver yields
/// every text frame and returns `None` after a close frame, a transport
/// error or the end of the stream.
pub(crate) async fn connect(url: &str) -> Result<mpsc::Receiver<String>, ProtocolError> {
    tracing::debug!(host = %redact(url), "Connecting to event stream");

    let (mut ws_stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| ProtocolError::WebSocket(e.to_string()))?;

    let (tx, rx) = mpsc::channel(FRAME_BUFFER);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = tx.closed() => {
                    tracing::debug!("Event stream receiver dropped, closing session");
                    let _ = ws_stream.close(None).await;
                    break;
                }
                frame = ws_stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(text.as_str().to_owned()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        match frame {
                            Some(cf) => tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "Event stream close frame received"
                            ),
                            None => tracing::info!("Event stream close frame received"),
                        }
                        // flushes the queued close reply
                        let _ = ws_stream.close(None).await;
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Event stream transport error");
                        break;
                    }
                    None => {
                        tracing::info!("Event stream ended");
                        break;
                    }
                    // tungstenite answers pings itself
                    Some(Ok(_)) => {}
                },
            }
        }
    });

    Ok(rx)
}

/// Strips the query string so tokens never reach the logs.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_token() {
        let url = event_stream_url("shc", 8080, "x y=z");
        assert_eq!(url, "ws://shc:8080/events?token=x%20y%3Dz");
    }

    #[test]
    fn redact_removes_query() {
        assert_eq!(redact("ws://shc:9090/events?token=abc"), "ws://shc:9090/events");
        assert_eq!(redact("ws://shc:9090/events"), "ws://shc:9090/events");
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect(&event_stream_url("127.0.0.1", port, "t")).await;
        assert!(matches!(result, Err(ProtocolError::WebSocket(_))));
    }
}
