//! Room membership storage behind a single lock.
//!
//! [`RoomTable`] is the plain data structure: room → join-ordered members,
//! plus a reverse index from peer to room that enforces global uniqueness
//! of peer identities. [`RoomRegistry`] wraps it in one
//! [`tokio::sync::RwLock`] so that a membership change and the notices it
//! triggers are computed from the same snapshot.
//!
//! # Invariants
//!
//! - A peer appears in at most one room.
//! - A room entry exists if and only if it has at least one member.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{PeerHandle, PeerId, RoomId};
use crate::error::RelayError;

/// One member of a room.
#[derive(Debug, Clone)]
pub struct Member {
    /// Identity the peer joined with.
    pub peer_id: PeerId,
    /// Non-owning reference to the peer's outbound queue.
    pub handle: PeerHandle,
    /// When the peer joined.
    pub joined_at: DateTime<Utc>,
}

/// Unsynchronized room map. Always accessed through [`RoomRegistry`].
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<RoomId, Vec<Member>>,
    locations: HashMap<PeerId, RoomId>,
}

impl RoomTable {
    /// Inserts a peer into a room, creating the room if absent.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DuplicatePeer`] if `peer_id` is already a
    /// member of any room.
    pub fn register(
        &mut self,
        room_id: &RoomId,
        peer_id: &PeerId,
        handle: PeerHandle,
    ) -> Result<(), RelayError> {
        if self.locations.contains_key(peer_id) {
            return Err(RelayError::DuplicatePeer(peer_id.clone()));
        }
        self.rooms.entry(room_id.clone()).or_default().push(Member {
            peer_id: peer_id.clone(),
            handle,
            joined_at: Utc::now(),
        });
        self.locations.insert(peer_id.clone(), room_id.clone());
        Ok(())
    }

    /// Removes a peer from a room, deleting the room if it becomes empty.
    ///
    /// Returns the removed member, or `None` if the peer was not in that
    /// room (repeated disconnect signals are harmless).
    pub fn unregister(&mut self, room_id: &RoomId, peer_id: &PeerId) -> Option<Member> {
        let members = self.rooms.get_mut(room_id)?;
        let position = members.iter().position(|m| &m.peer_id == peer_id)?;
        let member = members.remove(position);
        if members.is_empty() {
            self.rooms.remove(room_id);
        }
        self.locations.remove(peer_id);
        Some(member)
    }

    /// Returns the room's peers in join order, optionally skipping one.
    ///
    /// An unknown room yields an empty list.
    #[must_use]
    pub fn list_peers(&self, room_id: &RoomId, excluding: Option<&PeerId>) -> Vec<PeerId> {
        self.members(room_id)
            .iter()
            .filter(|m| Some(&m.peer_id) != excluding)
            .map(|m| m.peer_id.clone())
            .collect()
    }

    /// Returns the outbound handle of a room member.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PeerNotFound`] if the peer is not in the room.
    pub fn lookup(&self, room_id: &RoomId, peer_id: &PeerId) -> Result<&PeerHandle, RelayError> {
        self.members(room_id)
            .iter()
            .find(|m| &m.peer_id == peer_id)
            .map(|m| &m.handle)
            .ok_or_else(|| RelayError::PeerNotFound {
                room_id: room_id.clone(),
                peer_id: peer_id.clone(),
            })
    }

    /// Returns the room's members in join order (empty for unknown rooms).
    #[must_use]
    pub fn members(&self, room_id: &RoomId) -> &[Member] {
        self.rooms
            .get(room_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the room a peer is currently in.
    #[must_use]
    pub fn room_of(&self, peer_id: &PeerId) -> Option<&RoomId> {
        self.locations.get(peer_id)
    }

    /// Returns `true` if the room currently exists.
    #[must_use]
    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Number of rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of registered peers across all rooms.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.locations.len()
    }

    /// Removes members whose connection is gone without having left.
    ///
    /// Rooms emptied this way are deleted. Returns `(room, peer)` for every
    /// removed member so the caller can notify the remaining peers.
    pub fn prune_dead(&mut self) -> Vec<(RoomId, PeerId)> {
        let dead: Vec<(RoomId, PeerId)> = self
            .rooms
            .iter()
            .flat_map(|(room_id, members)| {
                members
                    .iter()
                    .filter(|m| !m.handle.is_alive())
                    .map(move |m| (room_id.clone(), m.peer_id.clone()))
            })
            .collect();
        for (room_id, peer_id) in &dead {
            self.unregister(room_id, peer_id);
        }
        dead
    }

    /// Deletes every room entry with no members. Returns how many went.
    ///
    /// A no-op while the invariants hold.
    pub fn remove_empty_rooms(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, members| !members.is_empty());
        before - self.rooms.len()
    }
}

/// Shared room registry.
///
/// # Concurrency
///
/// - Joins, leaves and sweeps take the write lock.
/// - Unicasts and status broadcasts take the read lock.
/// - Callers never hold either guard across a socket write; they only
///   enqueue onto [`PeerHandle`]s, which never blocks.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    table: RwLock<RoomTable>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the shared lock for a consistent read snapshot.
    pub async fn read(&self) -> RwLockReadGuard<'_, RoomTable> {
        self.table.read().await
    }

    /// Acquires the exclusive lock for a compound mutation.
    pub async fn write(&self) -> RwLockWriteGuard<'_, RoomTable> {
        self.table.write().await
    }

    /// Inserts a peer into a room.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DuplicatePeer`] if the identity is taken.
    pub async fn register(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        handle: PeerHandle,
    ) -> Result<(), RelayError> {
        self.table.write().await.register(room_id, peer_id, handle)
    }

    /// Removes a peer from a room. Returns `true` if it was present.
    pub async fn unregister(&self, room_id: &RoomId, peer_id: &PeerId) -> bool {
        self.table
            .write()
            .await
            .unregister(room_id, peer_id)
            .is_some()
    }

    /// Returns the room's peers in join order, optionally skipping one.
    pub async fn list_peers(&self, room_id: &RoomId, excluding: Option<&PeerId>) -> Vec<PeerId> {
        self.table.read().await.list_peers(room_id, excluding)
    }

    /// Returns a clone of a member's outbound handle.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PeerNotFound`] if the peer is not in the room.
    pub async fn lookup(&self, room_id: &RoomId, peer_id: &PeerId) -> Result<PeerHandle, RelayError> {
        self.table.read().await.lookup(room_id, peer_id).cloned()
    }

    /// Number of rooms.
    pub async fn room_count(&self) -> usize {
        self.table.read().await.room_count()
    }

    /// Number of registered peers.
    pub async fn peer_count(&self) -> usize {
        self.table.read().await.peer_count()
    }
}
