use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter collection for the session server. Counters are monotonic;
/// the point-in-time gauges (queue length, active matches, registered
/// players) live with their owners and are read on demand by the
/// metrics endpoint.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connection metrics
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub disconnections: AtomicU64,

    // Message metrics
    pub messages_received: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_dropped: AtomicU64,
    pub malformed_messages: AtomicU64,
    pub unknown_message_types: AtomicU64,

    // Matchmaking metrics
    pub requests_enqueued: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub requests_cancelled: AtomicU64,
    pub matches_created: AtomicU64,
    pub matches_ended: AtomicU64,
    pub match_id_retries: AtomicU64,

    // Chat metrics
    pub chat_messages_broadcast: AtomicU64,
    pub chat_messages_rejected: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_connections(&self) {
        // Atomic check-then-decrement to prevent underflow
        let _ =
            self.active_connections
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    if current > 0 {
                        Some(current - 1)
                    } else {
                        None
                    }
                });
        self.disconnections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_malformed_messages(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unknown_message_types(&self) {
        self.unknown_message_types.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_enqueued(&self) {
        self.requests_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_requests_cancelled(&self, count: u64) {
        self.requests_cancelled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_matches_created(&self) {
        self.matches_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_matches_ended(&self) {
        self.matches_ended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_match_id_retries(&self) {
        self.match_id_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chat_broadcasts(&self) {
        self.chat_messages_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chat_rejections(&self) {
        self.chat_messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections: ConnectionMetrics {
                total_connections: self.total_connections.load(Ordering::Relaxed),
                active_connections: self.active_connections.load(Ordering::Relaxed),
                disconnections: self.disconnections.load(Ordering::Relaxed),
            },
            messages: MessageMetrics {
                received: self.messages_received.load(Ordering::Relaxed),
                sent: self.messages_sent.load(Ordering::Relaxed),
                dropped: self.messages_dropped.load(Ordering::Relaxed),
                malformed: self.malformed_messages.load(Ordering::Relaxed),
                unknown_types: self.unknown_message_types.load(Ordering::Relaxed),
            },
            matchmaking: MatchmakingMetrics {
                requests_enqueued: self.requests_enqueued.load(Ordering::Relaxed),
                requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
                requests_cancelled: self.requests_cancelled.load(Ordering::Relaxed),
                matches_created: self.matches_created.load(Ordering::Relaxed),
                matches_ended: self.matches_ended.load(Ordering::Relaxed),
                match_id_retries: self.match_id_retries.load(Ordering::Relaxed),
            },
            chat: ChatMetrics {
                broadcast: self.chat_messages_broadcast.load(Ordering::Relaxed),
                rejected: self.chat_messages_rejected.load(Ordering::Relaxed),
            },
        }
    }
}

/// Point-in-time copy of every counter, shaped for the `/metrics`
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub connections: ConnectionMetrics,
    pub messages: MessageMetrics,
    pub matchmaking: MatchmakingMetrics,
    pub chat: ChatMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetrics {
    pub received: u64,
    pub sent: u64,
    pub dropped: u64,
    pub malformed: u64,
    pub unknown_types: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingMetrics {
    pub requests_enqueued: u64,
    pub requests_rejected: u64,
    pub requests_cancelled: u64,
    pub matches_created: u64,
    pub matches_ended: u64,
    pub match_id_retries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMetrics {
    pub broadcast: u64,
    pub rejected: u64,
}
