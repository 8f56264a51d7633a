use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::metrics::ServerMetrics;
use crate::protocol::{PlayerId, ServerMessage};
use crate::registry::PlayerRegistry;
use crate::simulation::ServerClock;
use crate::transport::Transport;

/// Channel that reaches every connected client. Any other channel name
/// is treated as a broadcast-group key, which is how match-scoped chat
/// works: clients use their match id as the channel.
pub const GLOBAL_CHANNEL: &str = "global";

/// One stored chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub channel: String,
    pub message: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("sender is not a registered player")]
    UnknownSender,
    #[error("channel name is empty")]
    EmptyChannel,
    #[error("message is empty")]
    EmptyMessage,
    #[error("message exceeds {max} characters")]
    MessageTooLong { max: usize },
    #[error("message contains control characters")]
    InvalidCharacters,
}

/// Chat fan-out with bounded per-channel history.
///
/// History is capped per channel; the oldest line is evicted when a
/// channel fills. Validation happens before anything is stored or sent.
pub struct ChatService {
    registry: Arc<PlayerRegistry>,
    transport: Arc<dyn Transport>,
    clock: Arc<ServerClock>,
    metrics: Arc<ServerMetrics>,
    history: Mutex<HashMap<String, VecDeque<ChatEntry>>>,
    max_message_length: usize,
    history_capacity: usize,
}

impl ChatService {
    pub fn new(
        registry: Arc<PlayerRegistry>,
        transport: Arc<dyn Transport>,
        clock: Arc<ServerClock>,
        metrics: Arc<ServerMetrics>,
        max_message_length: usize,
        history_capacity: usize,
    ) -> Self {
        Self {
            registry,
            transport,
            clock,
            metrics,
            history: Mutex::new(HashMap::new()),
            max_message_length,
            history_capacity,
        }
    }

    /// Validate, record, and broadcast one chat line. The global channel
    /// reaches every client; other channels reach their broadcast group.
    pub async fn handle_message(
        &self,
        player_id: PlayerId,
        channel: &str,
        message: &str,
    ) -> Result<(), ChatError> {
        if let Err(err) = self.validate(channel, message) {
            self.metrics.increment_chat_rejections();
            return Err(err);
        }

        let Some(sender) = self.registry.get(player_id) else {
            self.metrics.increment_chat_rejections();
            return Err(ChatError::UnknownSender);
        };

        let entry = ChatEntry {
            player_id,
            username: sender.username,
            channel: channel.to_string(),
            message: message.to_string(),
            timestamp_ms: self.clock.now_ms(),
        };

        {
            let mut history = self.history.lock();
            let lines = history.entry(entry.channel.clone()).or_default();
            if lines.len() == self.history_capacity {
                lines.pop_front();
            }
            lines.push_back(entry.clone());
        }

        let broadcast = Arc::new(ServerMessage::ChatMessage {
            player_id: entry.player_id,
            username: entry.username.clone(),
            channel: entry.channel.clone(),
            message: entry.message.clone(),
            timestamp: entry.timestamp_ms,
        });

        let result = if channel == GLOBAL_CHANNEL {
            self.transport.broadcast_to_all(broadcast).await
        } else {
            self.transport.broadcast_to_group(channel, broadcast).await
        };
        if let Err(err) = result {
            debug!(%player_id, channel, %err, "chat broadcast failed");
        }

        self.metrics.increment_chat_broadcasts();
        debug!(%player_id, channel, "chat message broadcast");
        Ok(())
    }

    /// The last `count` lines of a channel, oldest first.
    pub fn recent_messages(&self, channel: &str, count: usize) -> Vec<ChatEntry> {
        let history = self.history.lock();
        let Some(lines) = history.get(channel) else {
            return Vec::new();
        };
        let skip = lines.len().saturating_sub(count);
        lines.iter().skip(skip).cloned().collect()
    }

    /// Disconnect hook. History keeps the player's past lines.
    pub fn remove_player(&self, player_id: PlayerId) {
        debug!(%player_id, "chat participant removed");
    }

    fn validate(&self, channel: &str, message: &str) -> Result<(), ChatError> {
        if channel.trim().is_empty() {
            return Err(ChatError::EmptyChannel);
        }
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong {
                max: self.max_message_length,
            });
        }
        if message.chars().any(char::is_control) {
            return Err(ChatError::InvalidCharacters);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        to_all: Mutex<Vec<Arc<ServerMessage>>>,
        to_group: Mutex<Vec<(String, Arc<ServerMessage>)>>,
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            _player_id: PlayerId,
            _message: Arc<ServerMessage>,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn assign_to_group(
            &self,
            _player_id: PlayerId,
            _group_key: &str,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn broadcast_to_group(
            &self,
            group_key: &str,
            message: Arc<ServerMessage>,
        ) -> anyhow::Result<()> {
            self.to_group.lock().push((group_key.to_string(), message));
            Ok(())
        }

        async fn broadcast_to_all(&self, message: Arc<ServerMessage>) -> anyhow::Result<()> {
            self.to_all.lock().push(message);
            Ok(())
        }
    }

    struct Harness {
        registry: Arc<PlayerRegistry>,
        transport: Arc<RecordingTransport>,
        chat: ChatService,
    }

    fn harness_with_limits(max_message_length: usize, history_capacity: usize) -> Harness {
        let registry = Arc::new(PlayerRegistry::new());
        let transport = Arc::new(RecordingTransport::default());
        let chat = ChatService::new(
            Arc::clone(&registry),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(ServerClock::new()),
            Arc::new(ServerMetrics::new()),
            max_message_length,
            history_capacity,
        );
        Harness {
            registry,
            transport,
            chat,
        }
    }

    fn harness() -> Harness {
        harness_with_limits(512, 1000)
    }

    #[tokio::test]
    async fn global_messages_broadcast_to_everyone() {
        let h = harness();
        h.registry.add(1);

        h.chat.handle_message(1, "global", "hello there").await.unwrap();

        let broadcasts = h.transport.to_all.lock();
        assert_eq!(broadcasts.len(), 1);
        match &*broadcasts[0] {
            ServerMessage::ChatMessage {
                player_id,
                username,
                channel,
                message,
                ..
            } => {
                assert_eq!(*player_id, 1);
                assert_eq!(username, "Player1");
                assert_eq!(channel, "global");
                assert_eq!(message, "hello there");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_global_channels_route_to_their_group() {
        let h = harness();
        h.registry.add(2);

        h.chat
            .handle_message(2, "a3f09b2c11d4e8ff", "gg")
            .await
            .unwrap();

        assert!(h.transport.to_all.lock().is_empty());
        let group_broadcasts = h.transport.to_group.lock();
        assert_eq!(group_broadcasts.len(), 1);
        assert_eq!(group_broadcasts[0].0, "a3f09b2c11d4e8ff");
    }

    #[tokio::test]
    async fn rejects_invalid_content() {
        let h = harness_with_limits(8, 1000);
        h.registry.add(1);

        assert_eq!(
            h.chat.handle_message(1, "global", "").await,
            Err(ChatError::EmptyMessage)
        );
        assert_eq!(
            h.chat.handle_message(1, "global", "   ").await,
            Err(ChatError::EmptyMessage)
        );
        assert_eq!(
            h.chat.handle_message(1, "", "hi").await,
            Err(ChatError::EmptyChannel)
        );
        assert_eq!(
            h.chat.handle_message(1, "global", "way too long").await,
            Err(ChatError::MessageTooLong { max: 8 })
        );
        assert_eq!(
            h.chat.handle_message(1, "global", "bad\u{7}").await,
            Err(ChatError::InvalidCharacters)
        );

        assert!(h.transport.to_all.lock().is_empty());
        assert!(h.chat.recent_messages("global", 10).is_empty());
    }

    #[tokio::test]
    async fn rejects_unregistered_sender() {
        let h = harness();

        assert_eq!(
            h.chat.handle_message(9, "global", "boo").await,
            Err(ChatError::UnknownSender)
        );
        assert!(h.transport.to_all.lock().is_empty());
    }

    #[tokio::test]
    async fn history_is_bounded_with_oldest_eviction() {
        let h = harness_with_limits(512, 3);
        h.registry.add(1);

        for n in 1..=5 {
            h.chat
                .handle_message(1, "global", &format!("line {n}"))
                .await
                .unwrap();
        }

        let lines = h.chat.recent_messages("global", 10);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].message, "line 3");
        assert_eq!(lines[2].message, "line 5");
    }

    #[tokio::test]
    async fn recent_messages_returns_newest_suffix_in_order() {
        let h = harness();
        h.registry.add(1);

        for n in 1..=4 {
            h.chat
                .handle_message(1, "global", &format!("line {n}"))
                .await
                .unwrap();
        }

        let lines = h.chat.recent_messages("global", 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "line 3");
        assert_eq!(lines[1].message, "line 4");

        assert!(h.chat.recent_messages("empty-channel", 5).is_empty());
    }

    #[tokio::test]
    async fn remove_player_keeps_history() {
        let h = harness();
        h.registry.add(1);
        h.chat.handle_message(1, "global", "parting words").await.unwrap();

        h.chat.remove_player(1);

        let lines = h.chat.recent_messages("global", 10);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "parting words");
    }
}
