//! Shutdown signaling for pipeline coordination.
//!
//! Abstracts tokio's watch channels into a broadcast shutdown signal: one sender
//! notifies every subscribed receiver that the pipeline should stop at the next safe
//! boundary. The signal carries no data payload.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::fmt;

use futures::future::BoxFuture;
use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
///
/// Cloning is cheap and every clone notifies the same set of receivers.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    /// Signals shutdown to all subscribed receivers.
    ///
    /// Fails when no receiver is listening anymore, which callers may safely ignore:
    /// everything that could have reacted has already stopped.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    /// Creates a new receiver subscribed to this shutdown channel.
    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Receiver side of the shutdown channel.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a new shutdown channel.
///
/// The returned receiver starts unsignaled; receivers created later via
/// [`ShutdownTx::subscribe`] observe only signals sent after subscription.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(tx), rx)
}

/// Future that resolves once shutdown has been signalled.
///
/// Owns its receiver, so the same future can be polled across task wakeups and keeps its
/// waker registered with the channel between polls. Must not be polled again after it
/// has resolved.
pub struct ShutdownSignal {
    inner: BoxFuture<'static, ()>,
}

impl ShutdownSignal {
    /// Creates a signal future from a subscribed receiver.
    pub fn new(mut shutdown_rx: ShutdownRx) -> Self {
        Self {
            inner: Box::pin(async move {
                // A dropped sender means no signal can arrive anymore, so we stay
                // pending instead of reporting a spurious shutdown.
                if shutdown_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }),
        }
    }
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal").finish_non_exhaustive()
    }
}

/// Outcome of polling a shutdown-aware stream.
///
/// `Ok` carries the stream's regular output, while `Shutdown` carries whatever was
/// buffered when the shutdown signal was observed.
#[derive(Debug, PartialEq, Eq)]
pub enum ShutdownResult<T, S> {
    Ok(T),
    Shutdown(S),
}

impl<T, S> ShutdownResult<T, S> {
    /// Returns true when this result was produced by a shutdown signal.
    pub fn should_shutdown(&self) -> bool {
        matches!(self, ShutdownResult::Shutdown(_))
    }
}
