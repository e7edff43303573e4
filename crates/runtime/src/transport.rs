//! Bidirectional message transport between execution contexts.
//!
//! The bus is transport-agnostic: it only needs a way to push JSON values
//! out and a stream of JSON values coming in. [`PipeTransport`] is the
//! provided implementation, framing messages as a little-endian `u32`
//! length prefix followed by the JSON bytes over any `AsyncRead`/`AsyncWrite`
//! pair. The host transport that physically carries messages in production
//! is an external collaborator implementing the same traits.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Sending half of a transport.
pub trait Transport: Send {
    /// Sends one message to the peer context.
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Receiving half of a transport.
///
/// `run()` reads messages until EOF or error, forwarding each to the
/// message channel handed out at construction time.
pub trait TransportReceiver: Send {
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// The pieces a bus or server needs to own a transport.
pub struct TransportParts {
    pub sender: Box<dyn Transport>,
    pub receiver: Box<dyn TransportReceiver>,
    /// Incoming messages, fed by the receiver's read loop.
    pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Length-prefixed JSON transport over a byte pipe.
pub struct PipeTransport<W, R> {
    sender: PipeTransportSender<W>,
    receiver: PipeTransportReceiver<R>,
}

/// Writing half of a [`PipeTransport`].
pub struct PipeTransportSender<W> {
    writer: W,
}

/// Reading half of a [`PipeTransport`].
pub struct PipeTransportReceiver<R> {
    reader: R,
    message_tx: mpsc::UnboundedSender<Value>,
}

impl<W, R> PipeTransport<W, R>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Creates a transport over the given pipe halves, returning the
    /// channel on which received messages will be delivered.
    pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let transport = Self {
            sender: PipeTransportSender { writer },
            receiver: PipeTransportReceiver { reader, message_tx },
        };
        (transport, message_rx)
    }

    /// Splits into sender and receiver halves.
    pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
        (self.sender, self.receiver)
    }

    /// Boxes the halves into [`TransportParts`] for a bus or server.
    pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
        let (sender, receiver) = self.into_parts();
        TransportParts {
            sender: Box::new(sender),
            receiver: Box::new(receiver),
            message_rx,
        }
    }

    /// Runs the read loop without splitting (test convenience).
    pub async fn run(&mut self) -> Result<()> {
        self.receiver.read_loop().await
    }
}

impl<W> PipeTransportSender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Writes one framed message.
    pub async fn send(&mut self, message: Value) -> Result<()> {
        let json_bytes = serde_json::to_vec(&message)?;
        let length = json_bytes.len() as u32;

        self.writer
            .write_all(&length.to_le_bytes())
            .await
            .map_err(|e| Error::Transport(format!("Failed to write length prefix: {e}")))?;
        self.writer
            .write_all(&json_bytes)
            .await
            .map_err(|e| Error::Transport(format!("Failed to write message: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| Error::Transport(format!("Failed to flush message: {e}")))?;

        Ok(())
    }
}

impl<R> PipeTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_loop(&mut self) -> Result<()> {
        loop {
            let mut len_buf = [0u8; 4];
            match self.reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                // Clean EOF before a frame starts is a normal shutdown.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && len_buf == [0u8; 4] => {
                    return Ok(());
                }
                Err(e) => {
                    return Err(Error::Transport(format!(
                        "Failed to read length prefix: {e}"
                    )));
                }
            }
            let length = u32::from_le_bytes(len_buf) as usize;

            let mut msg_buf = vec![0u8; length];
            self.reader
                .read_exact(&mut msg_buf)
                .await
                .map_err(|e| Error::Transport(format!("Failed to read message body: {e}")))?;

            let message: Value = serde_json::from_slice(&msg_buf)?;
            if self.message_tx.send(message).is_err() {
                // Receiver side hung up; nothing left to deliver to.
                tracing::debug!("message channel closed, stopping read loop");
                return Ok(());
            }
        }
    }
}

impl<W> Transport for PipeTransportSender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { PipeTransportSender::send(self, message).await })
    }
}

impl<R> TransportReceiver for PipeTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move { self.read_loop().await })
    }
}

#[cfg(test)]
mod tests;
