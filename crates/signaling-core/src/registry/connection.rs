//! Connection handles
//!
//! A [`ConnectionHandle`] is the sending half of one client connection. The
//! transport that accepted the socket keeps the matching [`OutboundQueue`]
//! and drains it from a writer task, so `send` never waits on the network.
//! Clones of a handle share the same [`ConnectionId`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Default number of frames buffered for a connection before sends fail
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Identity of a single accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a frame could not be handed to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The outbound queue is at capacity
    QueueFull,
    /// The writer is gone or the connection was closed
    Closed,
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendFailure::QueueFull => write!(f, "outbound queue full"),
            SendFailure::Closed => write!(f, "connection closed"),
        }
    }
}

struct Inner {
    id: ConnectionId,
    frames: mpsc::Sender<String>,
    closed: watch::Sender<bool>,
}

/// Cloneable sending side of a client connection
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<Inner>,
}

impl ConnectionHandle {
    /// Create a handle and the queue its transport writer drains
    pub fn channel(capacity: usize) -> (Self, OutboundQueue) {
        let (frames_tx, frames_rx) = mpsc::channel(capacity.max(1));
        let (closed_tx, closed_rx) = watch::channel(false);
        let handle = Self {
            inner: Arc::new(Inner {
                id: ConnectionId::new(),
                frames: frames_tx,
                closed: closed_tx,
            }),
        };
        let queue = OutboundQueue {
            frames: frames_rx,
            closed: closed_rx,
        };
        (handle, queue)
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Whether both handles refer to the same accepted connection
    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        self.inner.id == other.inner.id
    }

    /// Enqueue a text frame without waiting
    pub fn send(&self, payload: String) -> Result<(), SendFailure> {
        if self.is_closed() {
            return Err(SendFailure::Closed);
        }
        self.inner.frames.try_send(payload).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SendFailure::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendFailure::Closed,
        })
    }

    /// Ask the transport to shut this connection down
    pub fn close(&self) {
        self.inner.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow() || self.inner.frames.is_closed()
    }

    /// Resolves once [`close`](Self::close) has been called
    pub async fn closed(&self) {
        let mut closed = self.inner.closed.subscribe();
        wait_closed(&mut closed).await;
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving side of a connection's outbound frames, owned by the transport
pub struct OutboundQueue {
    frames: mpsc::Receiver<String>,
    closed: watch::Receiver<bool>,
}

impl OutboundQueue {
    /// Next frame to write, or `None` once the connection is closed
    pub async fn next(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            _ = wait_closed(&mut self.closed) => None,
            frame = self.frames.recv() => frame,
        }
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            // Every handle is gone; the frame channel reports the end instead.
            std::future::pending::<()>().await;
        }
    }
}
