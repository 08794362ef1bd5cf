//! Peer lifecycle: join, leave, and periodic registry compaction.
//!
//! Every operation here takes the registry write lock once, applies the
//! membership change, and enqueues the resulting notices before releasing
//! it. Peers in a room therefore observe joins and leaves in commit order.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::MessageRouter;
use crate::domain::{Membership, Outbound, PeerId, RoomRegistry, RoomTable, ServerMessage};
use crate::error::RelayError;

/// Outcome of one registry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Members dropped because their connection was already gone.
    pub pruned_peers: usize,
    /// Room entries deleted.
    pub removed_rooms: usize,
}

impl SweepReport {
    /// Returns `true` if the sweep changed nothing.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.pruned_peers == 0 && self.removed_rooms == 0
    }
}

/// Translates connection events into registry mutations and notices.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    registry: Arc<RoomRegistry>,
}

impl LifecycleManager {
    /// Creates a lifecycle manager over the given registry.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Joins `target`, leaving `current` first when the connection is
    /// already in a room.
    ///
    /// On success the joiner is sent `peers` (everyone already present, in
    /// join order) and every other member of the target room is sent
    /// `new-peer`. Switching rooms also sends `peer-left` to the old room.
    /// Re-joining the exact room and identity the connection already holds
    /// only repeats the `peers` reply.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DuplicatePeer`] if another connection holds
    /// the identity; the connection's current membership is untouched.
    pub async fn join(
        &self,
        outbound: &Outbound,
        current: Option<&Membership>,
        target: Membership,
    ) -> Result<Membership, RelayError> {
        let mut table = self.registry.write().await;

        if let Some(owner) = table.room_of(&target.peer_id) {
            let ours = current.is_some_and(|c| c.peer_id == target.peer_id && &c.room_id == owner);
            if !ours {
                return Err(RelayError::DuplicatePeer(target.peer_id));
            }
            if current == Some(&target) {
                let peers = table.list_peers(&target.room_id, Some(&target.peer_id));
                send_peers(outbound, peers);
                return Ok(target);
            }
        }

        if let Some(previous) = current {
            remove_and_notify(&mut table, previous);
        }

        table.register(&target.room_id, &target.peer_id, outbound.handle())?;
        let peers = table.list_peers(&target.room_id, Some(&target.peer_id));
        let existing = peers.len();
        send_peers(outbound, peers);

        let notice = ServerMessage::NewPeer {
            peer_id: target.peer_id.clone(),
        };
        MessageRouter::broadcast(&table, &target.room_id, Some(&target.peer_id), &notice);

        tracing::info!(
            room_id = %target.room_id,
            peer_id = %target.peer_id,
            connection_id = %outbound.connection_id(),
            existing,
            "peer joined room"
        );
        Ok(target)
    }

    /// Removes a peer from its room and tells the remaining members.
    ///
    /// Returns `false` if the peer was already gone.
    pub async fn leave(&self, membership: &Membership) -> bool {
        let mut table = self.registry.write().await;
        remove_and_notify(&mut table, membership)
    }

    /// Prunes members whose connection vanished and deletes empty rooms.
    ///
    /// Idempotent; safe to run alongside normal traffic.
    pub async fn sweep(&self) -> SweepReport {
        let mut table = self.registry.write().await;
        let rooms_before = table.room_count();

        let pruned = table.prune_dead();
        for (room_id, peer_id) in &pruned {
            tracing::warn!(%room_id, %peer_id, "pruned member with closed connection");
            let notice = ServerMessage::PeerLeft {
                peer_id: peer_id.clone(),
            };
            MessageRouter::broadcast(&table, room_id, None, &notice);
        }
        table.remove_empty_rooms();

        SweepReport {
            pruned_peers: pruned.len(),
            removed_rooms: rooms_before.saturating_sub(table.room_count()),
        }
    }

    /// Spawns the background sweeper, running [`Self::sweep`] every
    /// `period`. The first sweep happens one full period after start.
    #[must_use]
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        let period = period.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = manager.sweep().await;
                if report.is_clean() {
                    tracing::debug!("room sweep found nothing to reclaim");
                } else {
                    tracing::info!(
                        pruned_peers = report.pruned_peers,
                        removed_rooms = report.removed_rooms,
                        "room sweep reclaimed state"
                    );
                }
            }
        })
    }
}

fn send_peers(outbound: &Outbound, peers: Vec<PeerId>) {
    if let Err(err) = MessageRouter::reply(outbound, &ServerMessage::Peers { peers }) {
        tracing::debug!(connection_id = %outbound.connection_id(), %err, "peers reply not delivered");
    }
}

fn remove_and_notify(table: &mut RoomTable, membership: &Membership) -> bool {
    let Membership { room_id, peer_id } = membership;
    if table.unregister(room_id, peer_id).is_none() {
        return false;
    }
    let notice = ServerMessage::PeerLeft {
        peer_id: peer_id.clone(),
    };
    let notified = MessageRouter::broadcast(table, room_id, None, &notice);
    tracing::info!(
        %room_id,
        %peer_id,
        notified,
        room_closed = !table.contains_room(room_id),
        "peer left room"
    );
    true
}
