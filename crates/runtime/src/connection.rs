//! WebSocket connection to a running engine.
//!
//! Requests carry a monotonically increasing id; the reader task routes each
//! response to the oneshot channel registered under that id. Messages without
//! an id are engine-initiated events and are logged at trace level.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use emrpilot_protocol::WsEndpoint;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Default budget for a single request/response round trip.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

/// A live connection to the engine.
///
/// Cloneable and cheap to share; all clones multiplex over one socket.
#[derive(Clone)]
pub struct Connection {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Pending,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl Connection {
    /// Dials the endpoint and starts the reader/writer tasks.
    pub async fn connect(endpoint: &WsEndpoint) -> Result<Self> {
        let (stream, _) = connect_async(endpoint.as_str())
            .await
            .map_err(|source| Error::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;
        debug!(target = "emrpilot.connection", endpoint = %endpoint, "connected");

        let (mut sink, mut source) = stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader_pending = pending.clone();
        let reader_closed = closed.clone();
        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => dispatch(&reader_pending, &text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(target = "emrpilot.connection", error = %e, "read failed");
                        break;
                    }
                }
            }
            reader_closed.store(true, Ordering::SeqCst);
            // Wake every caller still waiting on a response.
            let mut pending = reader_pending.lock();
            for (_, tx) in pending.drain() {
                let _ = tx.send(Err(Error::ConnectionClosed));
            }
        });

        Ok(Self {
            outgoing,
            pending,
            next_id: Arc::new(AtomicU64::new(1)),
            closed,
        })
    }

    /// Sends a request and awaits its response with the default budget.
    pub async fn send(&self, method: &str, params: Value) -> Result<Value> {
        self.send_with_timeout(method, params, DEFAULT_REQUEST_TIMEOUT_MS)
            .await
    }

    /// Sends a request and awaits its response within `timeout_ms`.
    pub async fn send_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout_ms: u64,
    ) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let frame = json!({ "id": id, "method": method, "params": params });
        if self
            .outgoing
            .send(Message::Text(frame.to_string().into()))
            .is_err()
        {
            self.pending.lock().remove(&id);
            return Err(Error::ConnectionClosed);
        }

        match tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(Error::Timeout {
                    ms: timeout_ms,
                    method: method.to_string(),
                })
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Routes one incoming text frame to its waiting caller.
fn dispatch(pending: &Pending, text: &str) {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(target = "emrpilot.connection", error = %e, "non-JSON frame dropped");
            return;
        }
    };

    let Some(id) = value.get("id").and_then(Value::as_u64) else {
        trace!(target = "emrpilot.connection", "event frame: {value}");
        return;
    };

    let Some(tx) = pending.lock().remove(&id) else {
        trace!(target = "emrpilot.connection", id, "response for unknown id");
        return;
    };

    let outcome = if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown engine error");
        Err(Error::Protocol(message.to_string()))
    } else {
        Ok(value.get("result").cloned().unwrap_or(Value::Null))
    };
    let _ = tx.send(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_with(id: u64) -> (Pending, oneshot::Receiver<Result<Value>>) {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().insert(id, tx);
        (pending, rx)
    }

    #[tokio::test]
    async fn dispatch_routes_result_by_id() {
        let (pending, rx) = pending_with(7);
        dispatch(&pending, r#"{"id": 7, "result": {"value": 42}}"#);
        let value = rx.await.unwrap().unwrap();
        assert_eq!(value["value"], json!(42));
        assert!(pending.lock().is_empty());
    }

    #[tokio::test]
    async fn dispatch_converts_error_frames() {
        let (pending, rx) = pending_with(3);
        dispatch(&pending, r#"{"id": 3, "error": {"message": "no such frame"}}"#);
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg == "no such frame"));
    }

    #[tokio::test]
    async fn dispatch_ignores_events_and_unknown_ids() {
        let (pending, _rx) = pending_with(1);
        dispatch(&pending, r#"{"method": "page.console", "params": {}}"#);
        dispatch(&pending, r#"{"id": 99, "result": null}"#);
        assert_eq!(pending.lock().len(), 1);
    }
}
