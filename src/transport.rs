use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::ServerMetrics;
use crate::protocol::{PlayerId, ServerMessage};

/// Outbound delivery capability injected into the subsystems that notify
/// clients. Broadcast groups gather the members of a match under its id
/// so match-scoped messages reach every member with one call.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a message to one client. Unknown ids are logged and
    /// ignored rather than treated as errors.
    async fn send(&self, player_id: PlayerId, message: Arc<ServerMessage>) -> anyhow::Result<()>;

    /// Place a client in a broadcast group, replacing any previous
    /// membership. A client belongs to at most one group at a time.
    async fn assign_to_group(&self, player_id: PlayerId, group_key: &str) -> anyhow::Result<()>;

    /// Deliver a message to every member of a group.
    async fn broadcast_to_group(
        &self,
        group_key: &str,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<()>;

    /// Deliver a message to every connected client.
    async fn broadcast_to_all(&self, message: Arc<ServerMessage>) -> anyhow::Result<()>;
}

/// In-memory WebSocket transport: one bounded outbound queue per client,
/// drained by that client's send task.
///
/// Messages offered to a full queue are dropped and counted rather than
/// awaited, so no caller ever blocks on a slow client.
pub struct WsTransport {
    clients: DashMap<PlayerId, mpsc::Sender<Arc<ServerMessage>>>,
    groups: DashMap<String, HashSet<PlayerId>>,
    player_groups: DashMap<PlayerId, String>,
    next_player_id: AtomicU64,
    metrics: Arc<ServerMetrics>,
}

impl WsTransport {
    pub fn new(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            clients: DashMap::new(),
            groups: DashMap::new(),
            player_groups: DashMap::new(),
            next_player_id: AtomicU64::new(1),
            metrics,
        }
    }

    /// Allocate the next connection-unique player id. Ids start at 1 and
    /// are never reused within a server's lifetime.
    pub fn allocate_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Attach a client's outbound queue. Called by the WebSocket layer
    /// once the send task owns the receiving half.
    pub fn register(&self, player_id: PlayerId, sender: mpsc::Sender<Arc<ServerMessage>>) {
        self.clients.insert(player_id, sender);
        debug!(%player_id, "transport client registered");
    }

    /// Detach a client and drop its group membership. Empty groups are
    /// removed.
    pub fn unregister(&self, player_id: PlayerId) {
        self.clients.remove(&player_id);
        if let Some((_, group_key)) = self.player_groups.remove(&player_id) {
            self.drop_group_member(&group_key, player_id);
        }
        debug!(%player_id, "transport client unregistered");
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.clients.contains_key(&player_id)
    }

    /// Member snapshot for a group; empty when the group does not exist.
    pub fn group_members(&self, group_key: &str) -> Vec<PlayerId> {
        self.groups
            .get(group_key)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn drop_group_member(&self, group_key: &str, player_id: PlayerId) {
        let mut now_empty = false;
        if let Some(mut members) = self.groups.get_mut(group_key) {
            members.remove(&player_id);
            now_empty = members.is_empty();
        }
        if now_empty {
            self.groups.remove_if(group_key, |_, members| members.is_empty());
        }
    }

    fn deliver(&self, player_id: PlayerId, message: &Arc<ServerMessage>) {
        let Some(sender) = self.clients.get(&player_id) else {
            debug!(%player_id, "message for unconnected player discarded");
            return;
        };
        match sender.try_send(Arc::clone(message)) {
            Ok(()) => self.metrics.increment_messages_sent(),
            Err(_) => {
                warn!(%player_id, "outbound queue full, message dropped");
                self.metrics.increment_messages_dropped();
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn send(&self, player_id: PlayerId, message: Arc<ServerMessage>) -> anyhow::Result<()> {
        self.deliver(player_id, &message);
        Ok(())
    }

    async fn assign_to_group(&self, player_id: PlayerId, group_key: &str) -> anyhow::Result<()> {
        let previous = self
            .player_groups
            .insert(player_id, group_key.to_string());
        if let Some(previous_key) = previous {
            if previous_key != group_key {
                self.drop_group_member(&previous_key, player_id);
            }
        }
        self.groups
            .entry(group_key.to_string())
            .or_default()
            .insert(player_id);
        debug!(%player_id, group_key, "player assigned to broadcast group");
        Ok(())
    }

    async fn broadcast_to_group(
        &self,
        group_key: &str,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<()> {
        // Snapshot the membership before delivering so the group shard
        // lock is not held across sends.
        let members = self.group_members(group_key);
        for player_id in members {
            self.deliver(player_id, &message);
        }
        Ok(())
    }

    async fn broadcast_to_all(&self, message: Arc<ServerMessage>) -> anyhow::Result<()> {
        let ids: Vec<PlayerId> = self.clients.iter().map(|entry| *entry.key()).collect();
        for player_id in ids {
            self.deliver(player_id, &message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_transport() -> WsTransport {
        WsTransport::new(Arc::new(ServerMetrics::new()))
    }

    fn connect(transport: &WsTransport, id: PlayerId) -> mpsc::Receiver<Arc<ServerMessage>> {
        let (sender, receiver) = mpsc::channel(8);
        transport.register(id, sender);
        receiver
    }

    fn pong(server_time: u64) -> Arc<ServerMessage> {
        Arc::new(ServerMessage::Pong { server_time })
    }

    #[test]
    fn player_ids_are_monotonic_from_one() {
        let transport = test_transport();
        assert_eq!(transport.allocate_player_id(), 1);
        assert_eq!(transport.allocate_player_id(), 2);
        assert_eq!(transport.allocate_player_id(), 3);
    }

    #[tokio::test]
    async fn send_delivers_to_registered_client() {
        let transport = test_transport();
        let mut receiver = connect(&transport, 1);

        transport.send(1, pong(99)).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert!(matches!(*received, ServerMessage::Pong { server_time: 99 }));
    }

    #[tokio::test]
    async fn send_to_unknown_player_is_not_an_error() {
        let transport = test_transport();
        transport.send(42, pong(1)).await.unwrap();
    }

    #[tokio::test]
    async fn full_outbound_queue_drops_instead_of_blocking() {
        let transport = test_transport();
        let (sender, mut receiver) = mpsc::channel(1);
        transport.register(1, sender);

        transport.send(1, pong(1)).await.unwrap();
        transport.send(1, pong(2)).await.unwrap();

        let first = receiver.recv().await.unwrap();
        assert!(matches!(*first, ServerMessage::Pong { server_time: 1 }));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn group_broadcast_reaches_only_members() {
        let transport = test_transport();
        let mut in_group = connect(&transport, 1);
        let mut outside = connect(&transport, 2);

        transport.assign_to_group(1, "match-a").await.unwrap();
        transport
            .broadcast_to_group("match-a", pong(7))
            .await
            .unwrap();

        assert!(in_group.recv().await.is_some());
        assert!(outside.try_recv().is_err());
    }

    #[tokio::test]
    async fn reassignment_moves_player_between_groups() {
        let transport = test_transport();
        let mut receiver = connect(&transport, 1);

        transport.assign_to_group(1, "match-a").await.unwrap();
        transport.assign_to_group(1, "match-b").await.unwrap();

        transport.broadcast_to_group("match-a", pong(1)).await.unwrap();
        assert!(receiver.try_recv().is_err());

        transport.broadcast_to_group("match-b", pong(2)).await.unwrap();
        assert!(receiver.recv().await.is_some());

        // The vacated group is gone entirely.
        assert!(transport.group_members("match-a").is_empty());
    }

    #[tokio::test]
    async fn unregister_clears_group_membership() {
        let transport = test_transport();
        let _receiver = connect(&transport, 1);
        transport.assign_to_group(1, "match-a").await.unwrap();

        transport.unregister(1);

        assert!(!transport.is_connected(1));
        assert_eq!(transport.client_count(), 0);
        assert!(transport.group_members("match-a").is_empty());
    }

    #[tokio::test]
    async fn broadcast_to_all_reaches_every_client() {
        let transport = test_transport();
        let mut first = connect(&transport, 1);
        let mut second = connect(&transport, 2);

        transport.broadcast_to_all(pong(5)).await.unwrap();

        assert!(first.recv().await.is_some());
        assert!(second.recv().await.is_some());
    }
}
