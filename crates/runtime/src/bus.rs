//! RPC bus - typed request/response between execution contexts.
//!
//! This module implements the request/response correlation layer on top of
//! the transport. It handles:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Dispatching operations to a handler on the service side
//!
//! # Message Flow
//!
//! 1. Client calls `request()` with an operation name and arguments
//! 2. The bus generates a unique ID and creates a oneshot channel
//! 3. The request is serialized and sent via the transport
//! 4. The client awaits on the oneshot receiver
//! 5. The service's dispatch loop hands the operation to its handler
//! 6. The handler's envelope is sent back and correlated by ID
//! 7. The client receives the envelope
//!
//! Exactly one response is produced per request. Independent requests have
//! no ordering guarantee; callers that need ordering await sequentially.
//! A handler signals failure through the envelope's `error` field - the
//! bus itself only fails on transport-level problems.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use lnb_protocol::{Envelope, RpcRequest, RpcResponse};
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Service-side operation handler.
///
/// `handle` always resolves with an envelope; business failures travel as
/// the envelope's `error` string, never as a rejection across the boundary.
pub trait RpcHandler: Send + Sync {
    fn handle(
        &self,
        op: &str,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = Envelope<Value>> + Send + '_>>;
}

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Envelope<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
    id: u32,
    callbacks: CallbackMap,
    completed: bool,
}

impl CancelGuard {
    fn new(id: u32, callbacks: CallbackMap) -> Self {
        Self {
            id,
            callbacks,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let id = self.id;
        let callbacks = Arc::clone(&self.callbacks);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if callbacks.lock().await.remove(&id).is_some() {
                    tracing::debug!(id, "CancelGuard: removed orphaned callback");
                }
            });
        }
    }
}

/// Future returned by [`RpcBus::request`] with automatic cancellation cleanup.
struct ResponseFuture {
    rx: oneshot::Receiver<Envelope<Value>>,
    guard: CancelGuard,
}

impl Future for ResponseFuture {
    type Output = Result<Envelope<Value>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.guard.complete();
                Poll::Ready(result.map_err(|_| Error::ChannelClosed))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Client side of the RPC bus.
///
/// Manages request/response correlation with sequential request IDs and a
/// oneshot channel per in-flight request.
pub struct RpcBus {
    /// Sequential request ID counter (atomic for thread safety)
    last_id: AtomicU32,
    /// Pending request callbacks keyed by request ID
    callbacks: CallbackMap,
    /// Channel for queueing outbound messages to the writer task
    outbound_tx: mpsc::UnboundedSender<Value>,
    /// Transport sender (taken by run() to start the writer task)
    transport_sender: TokioMutex<Option<Box<dyn Transport>>>,
    /// Receiver half of the transport (taken by run(), only needed once)
    transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
    /// Incoming messages from the transport
    message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Receiver for outbound messages (taken by run() to start the writer task)
    outbound_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl RpcBus {
    /// Creates a new bus over the given transport.
    pub fn new(parts: TransportParts) -> Self {
        let TransportParts {
            sender,
            receiver,
            message_rx,
        } = parts;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Self {
            last_id: AtomicU32::new(0),
            callbacks: Arc::new(TokioMutex::new(HashMap::new())),
            outbound_tx,
            transport_sender: TokioMutex::new(Some(sender)),
            transport_receiver: TokioMutex::new(Some(receiver)),
            message_rx: TokioMutex::new(Some(message_rx)),
            outbound_rx: TokioMutex::new(Some(outbound_rx)),
        }
    }

    /// Sends an operation to the service context and awaits its envelope.
    ///
    /// The returned `Result` is `Err` only for transport-level failure;
    /// handler failures arrive as `Envelope { error: Some(..) }`. There is
    /// no built-in deadline - a hung handler hangs this future (see
    /// [`RpcBus::request_with_timeout`]).
    pub async fn request(&self, op: &str, args: Value) -> Result<Envelope<Value>> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(id, op, "sending request");

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().await.insert(id, tx);

        let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

        let request = RpcRequest {
            id,
            op: op.to_string(),
            args,
        };

        let request_value = serde_json::to_value(&request)?;

        if self.outbound_tx.send(request_value).is_err() {
            tracing::error!("failed to queue request: outbound channel closed");
            return Err(Error::ChannelClosed);
        }

        ResponseFuture { rx, guard }.await
    }

    /// [`RpcBus::request`] with an explicit deadline.
    ///
    /// Returns [`Error::Timeout`] if no response arrives in time; the
    /// orphaned callback is cleaned up when the inner future is dropped.
    pub async fn request_with_timeout(
        &self,
        op: &str,
        args: Value,
        timeout: Duration,
    ) -> Result<Envelope<Value>> {
        match tokio::time::timeout(timeout, self.request(op, args)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "no response to '{op}' within {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Runs the message dispatch loop. Must be called exactly once.
    pub async fn run(self: &Arc<Self>) {
        let transport_receiver = self
            .transport_receiver
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport receiver already taken");

        let mut transport_sender = self
            .transport_sender
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport sender already taken");

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - outbound receiver already taken");

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("transport read error: {e}");
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = transport_sender.send(message).await {
                    tracing::error!("transport write error: {e}");
                    break;
                }
            }
        });

        let mut message_rx = self
            .message_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - message receiver already taken");

        while let Some(message_value) = message_rx.recv().await {
            match serde_json::from_value::<RpcResponse>(message_value) {
                Ok(response) => {
                    if let Err(e) = self.dispatch_internal(response).await {
                        tracing::error!("error dispatching response: {e}");
                    }
                }
                Err(e) => {
                    tracing::error!("failed to parse response: {e}");
                }
            }
        }

        // Message channel closed: the transport is gone. Fail everything
        // still in flight instead of hanging the callers.
        self.callbacks.lock().await.clear();

        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }

    /// Dispatches an incoming response (test-only public version).
    #[cfg(test)]
    pub async fn dispatch(self: &Arc<Self>, response: RpcResponse) -> Result<()> {
        self.dispatch_internal(response).await
    }

    async fn dispatch_internal(self: &Arc<Self>, response: RpcResponse) -> Result<()> {
        let callback = self
            .callbacks
            .lock()
            .await
            .remove(&response.id)
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "Cannot find request to respond: id={}",
                    response.id
                ))
            })?;

        let envelope = Envelope {
            data: response.data,
            error: response.error,
        };

        let _ = callback.send(envelope);
        Ok(())
    }
}

/// Service side of the RPC bus.
///
/// Reads requests from the transport, dispatches each to the handler on its
/// own task (no ordering between concurrent requests), and writes exactly
/// one response per request.
pub struct RpcServer {
    handler: Arc<dyn RpcHandler>,
    transport_sender: TokioMutex<Option<Box<dyn Transport>>>,
    transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
    message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl RpcServer {
    /// Creates a server over the given transport and handler.
    pub fn new(parts: TransportParts, handler: Arc<dyn RpcHandler>) -> Self {
        let TransportParts {
            sender,
            receiver,
            message_rx,
        } = parts;

        Self {
            handler,
            transport_sender: TokioMutex::new(Some(sender)),
            transport_receiver: TokioMutex::new(Some(receiver)),
            message_rx: TokioMutex::new(Some(message_rx)),
        }
    }

    /// Runs the dispatch loop until the transport closes. Must be called
    /// exactly once.
    pub async fn run(&self) {
        let transport_receiver = self
            .transport_receiver
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport receiver already taken");

        let mut transport_sender = self
            .transport_sender
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport sender already taken");

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("transport read error: {e}");
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = transport_sender.send(message).await {
                    tracing::error!("transport write error: {e}");
                    break;
                }
            }
        });

        let mut message_rx = self
            .message_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - message receiver already taken");

        while let Some(message_value) = message_rx.recv().await {
            let request: RpcRequest = match serde_json::from_value(message_value) {
                Ok(request) => request,
                Err(e) => {
                    // Without an id there is nothing to correlate a reply to.
                    tracing::error!("failed to parse request: {e}");
                    continue;
                }
            };

            let handler = Arc::clone(&self.handler);
            let outbound_tx = outbound_tx.clone();
            tokio::spawn(async move {
                tracing::debug!(id = request.id, op = %request.op, "dispatching request");
                let envelope = handler.handle(&request.op, request.args).await;
                let response = RpcResponse {
                    id: request.id,
                    data: envelope.data,
                    error: envelope.error,
                };
                match serde_json::to_value(&response) {
                    Ok(value) => {
                        let _ = outbound_tx.send(value);
                    }
                    Err(e) => tracing::error!("failed to serialize response: {e}"),
                }
            });
        }

        drop(outbound_tx);
        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }
}
