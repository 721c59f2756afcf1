//! Event Broadcasting
//!
//! Per-player outbound channels. The transport registers one sink per
//! connected player; the service pushes notifications through it. A sink
//! that fails delivery is pruned so later broadcasts skip it.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::ids::UserId;
use crate::network::protocol::ServerMessage;

/// Why a notification was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Channel closed on the receiving end.
    #[error("Receiver disconnected")]
    Disconnected,

    /// Bounded channel has no room.
    #[error("Receiver queue is full")]
    Saturated,

    /// Player has no channel.
    #[error("No channel registered for {0}")]
    NotRegistered(UserId),
}

/// Outbound channel to one player.
pub trait EventSink: Send + Sync {
    /// Push a message without waiting.
    fn deliver(&self, message: &ServerMessage) -> Result<(), DeliveryError>;
}

impl EventSink for mpsc::Sender<ServerMessage> {
    fn deliver(&self, message: &ServerMessage) -> Result<(), DeliveryError> {
        self.try_send(message.clone()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Saturated,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
        })
    }
}

impl EventSink for mpsc::UnboundedSender<ServerMessage> {
    fn deliver(&self, message: &ServerMessage) -> Result<(), DeliveryError> {
        self.send(message.clone())
            .map_err(|_| DeliveryError::Disconnected)
    }
}

/// Counts from one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sinks that accepted the message
    pub delivered: usize,
    /// Recipients with no registered sink
    pub skipped: Vec<UserId>,
    /// Recipients whose sink failed and was removed
    pub pruned: Vec<UserId>,
}

/// Registry of player sinks.
#[derive(Default)]
pub struct EventBroadcaster {
    channels: DashMap<UserId, Arc<dyn EventSink>>,
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("channels", &self.channels.len())
            .finish()
    }
}

impl EventBroadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a player's sink.
    pub fn register(&self, user: UserId, sink: Arc<dyn EventSink>) {
        if self.channels.insert(user, sink).is_some() {
            debug!(%user, "replaced event channel");
        }
    }

    /// Register a bounded tokio channel.
    pub fn register_channel(&self, user: UserId, sender: mpsc::Sender<ServerMessage>) {
        self.register(user, Arc::new(sender));
    }

    /// Drop a player's sink. Returns whether one was registered.
    pub fn unregister(&self, user: UserId) -> bool {
        self.channels.remove(&user).is_some()
    }

    /// Whether a player has a sink.
    pub fn is_registered(&self, user: UserId) -> bool {
        self.channels.contains_key(&user)
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no sink is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver to one player. A failing sink is pruned.
    pub fn notify_one(&self, user: UserId, message: &ServerMessage) -> Result<(), DeliveryError> {
        let sink = self
            .channels
            .get(&user)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DeliveryError::NotRegistered(user))?;
        self.deliver_or_prune(user, &sink, message)
    }

    /// Deliver to each of `recipients` that has a sink.
    pub fn notify_players(&self, recipients: &[UserId], message: &ServerMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for &user in recipients {
            match self.notify_one(user, message) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::NotRegistered(_)) => report.skipped.push(user),
                Err(_) => report.pruned.push(user),
            }
        }
        report
    }

    /// Deliver to every registered sink.
    pub fn notify_all(&self, message: &ServerMessage) -> BroadcastReport {
        // Snapshot first so no map shard is held while delivering.
        let targets: Vec<(UserId, Arc<dyn EventSink>)> = self
            .channels
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut report = BroadcastReport::default();
        for (user, sink) in targets {
            match self.deliver_or_prune(user, &sink, message) {
                Ok(()) => report.delivered += 1,
                Err(_) => report.pruned.push(user),
            }
        }
        report
    }

    fn deliver_or_prune(
        &self,
        user: UserId,
        sink: &Arc<dyn EventSink>,
        message: &ServerMessage,
    ) -> Result<(), DeliveryError> {
        sink.deliver(message).map_err(|err| {
            warn!(%user, error = %err, "dropping event channel");
            // Only remove the sink that failed, not a replacement registered meanwhile.
            self.channels
                .remove_if(&user, |_, current| Arc::ptr_eq(current, sink));
            err
        })
    }
}
