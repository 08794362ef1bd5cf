//! Per-connection outbound queues.
//!
//! Every connection task owns an [`Outbound`], the only strong sender of
//! a bounded [`tokio::sync::mpsc`] queue whose receiver the same task
//! drains into its socket. The registry stores a [`PeerHandle`] holding a
//! *weak* sender: it can enqueue while the connection lives but never keeps
//! the queue open on its own. When the task ends, its `Outbound` is dropped
//! and every outstanding handle starts reporting [`RelayError::PeerGone`].
//!
//! Enqueueing uses `try_send` and never waits. A peer that stops draining
//! fills its queue, and further messages for it are dropped and reported as
//! [`RelayError::PeerGone`] until it catches up. The actual socket write
//! happens later in the recipient's own task.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::ConnectionId;
use crate::error::RelayError;

/// Default number of messages buffered per connection.
pub const DEFAULT_CAPACITY: usize = 256;

/// Receiving half of a connection's outbound queue.
pub type OutboundReceiver = mpsc::Receiver<String>;

/// Creates the outbound queue for one connection.
///
/// A `capacity` of zero is raised to one.
#[must_use]
pub fn channel(connection_id: ConnectionId, capacity: usize) -> (Outbound, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Outbound { connection_id, tx }, rx)
}

/// Owning end of a connection's outbound queue.
#[derive(Debug)]
pub struct Outbound {
    connection_id: ConnectionId,
    tx: mpsc::Sender<String>,
}

impl Outbound {
    /// Returns the connection this queue belongs to.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Returns a non-owning handle suitable for storing in the registry.
    #[must_use]
    pub fn handle(&self) -> PeerHandle {
        PeerHandle {
            connection_id: self.connection_id,
            tx: self.tx.downgrade(),
        }
    }

    /// Enqueues a serialized message for this connection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PeerGone`] if the receiving half was dropped
    /// or the queue is full.
    pub fn send(&self, text: String) -> Result<(), RelayError> {
        enqueue(&self.tx, self.connection_id, text)
    }
}

/// Non-owning, cloneable reference to a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    connection_id: ConnectionId,
    tx: mpsc::WeakSender<String>,
}

impl PeerHandle {
    /// Returns the connection this handle points at.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Best-effort enqueue of a serialized message.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PeerGone`] if the owning connection has
    /// dropped its [`Outbound`], stopped reading, or fallen a full queue
    /// behind.
    pub fn deliver(&self, text: String) -> Result<(), RelayError> {
        let tx = self.tx.upgrade().ok_or(RelayError::PeerGone)?;
        enqueue(&tx, self.connection_id, text)
    }

    /// Returns `true` while the owning connection can still receive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.tx.upgrade().is_some_and(|tx| !tx.is_closed())
    }
}

fn enqueue(
    tx: &mpsc::Sender<String>,
    connection_id: ConnectionId,
    text: String,
) -> Result<(), RelayError> {
    match tx.try_send(text) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            tracing::debug!(%connection_id, "outbound queue full, message dropped");
            Err(RelayError::PeerGone)
        }
        Err(TrySendError::Closed(_)) => Err(RelayError::PeerGone),
    }
}
