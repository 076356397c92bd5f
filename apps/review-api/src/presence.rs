//! Live connection tracking and event push.
//!
//! A user has at most one live connection. Registering a new one replaces
//! the old mapping, and a late disconnect from the replaced connection must
//! not remove the newer one, so unregistration is keyed by connection id.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use shared_types::LiveEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events buffered per connection before pushes are dropped.
pub const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Bidirectional user/connection mapping.
pub trait PresenceStore: Send + Sync {
    /// Map `user_id` to `connection`, returning the connection it replaced.
    fn insert(&self, user_id: &str, connection: ConnectionId) -> Option<ConnectionId>;

    /// Remove `connection`, returning the user it belonged to if it was current.
    fn remove_connection(&self, connection: ConnectionId) -> Option<String>;

    fn lookup(&self, user_id: &str) -> Option<ConnectionId>;
}

#[derive(Default)]
struct Mappings {
    by_user: HashMap<String, ConnectionId>,
    by_connection: HashMap<ConnectionId, String>,
}

#[derive(Default)]
pub struct InMemoryPresenceStore {
    inner: RwLock<Mappings>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresenceStore for InMemoryPresenceStore {
    fn insert(&self, user_id: &str, connection: ConnectionId) -> Option<ConnectionId> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let previous = inner.by_user.insert(user_id.to_string(), connection);
        if let Some(previous) = previous {
            inner.by_connection.remove(&previous);
        }
        inner.by_connection.insert(connection, user_id.to_string());
        previous
    }

    fn remove_connection(&self, connection: ConnectionId) -> Option<String> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let user_id = inner.by_connection.remove(&connection)?;
        if inner.by_user.get(&user_id) == Some(&connection) {
            inner.by_user.remove(&user_id);
        }
        Some(user_id)
    }

    fn lookup(&self, user_id: &str) -> Option<ConnectionId> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_user.get(user_id).copied()
    }
}

#[derive(Clone)]
pub struct PresenceRegistry {
    store: Arc<dyn PresenceStore>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryPresenceStore::new()))
    }
}

impl PresenceRegistry {
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self { store }
    }

    pub fn register_connection(&self, user_id: &str, connection: ConnectionId) {
        if let Some(previous) = self.store.insert(user_id, connection) {
            debug!(user_id, %previous, %connection, "Connection replaced");
        }
    }

    /// No-op for connections that are unknown or already replaced.
    pub fn unregister_connection(&self, connection: ConnectionId) {
        if let Some(user_id) = self.store.remove_connection(connection) {
            debug!(%user_id, %connection, "Connection unregistered");
        }
    }

    pub fn connection_for(&self, user_id: &str) -> Option<ConnectionId> {
        self.store.lookup(user_id)
    }
}

/// Delivers [`LiveEvent`]s to whichever connection a user currently holds.
pub struct Notifier {
    registry: PresenceRegistry,
    channels: RwLock<HashMap<ConnectionId, mpsc::Sender<LiveEvent>>>,
}

/// Receiving end of a registered connection.
///
/// Dropping it unregisters the connection.
pub struct LiveConnection {
    pub id: ConnectionId,
    pub events: mpsc::Receiver<LiveEvent>,
    _guard: ConnectionGuard,
}

struct ConnectionGuard {
    notifier: Arc<Notifier>,
    id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.notifier.disconnect(self.id);
    }
}

impl Notifier {
    pub fn new(registry: PresenceRegistry) -> Self {
        Self {
            registry,
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }

    pub fn connect(self: &Arc<Self>, user_id: &str) -> LiveConnection {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);
        self.registry.register_connection(user_id, id);
        info!(user_id, connection = %id, "Live connection opened");

        LiveConnection {
            id,
            events: rx,
            _guard: ConnectionGuard {
                notifier: Arc::clone(self),
                id,
            },
        }
    }

    pub fn disconnect(&self, connection: ConnectionId) {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&connection);
        self.registry.unregister_connection(connection);
    }

    /// Best-effort push. Returns whether the event was queued.
    pub fn push(&self, user_id: &str, event_name: &str, payload: Value) -> bool {
        let Some(connection) = self.registry.connection_for(user_id) else {
            debug!(user_id, event = event_name, "No live connection, event dropped");
            return false;
        };
        let sender = {
            let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
            channels.get(&connection).cloned()
        };
        let Some(sender) = sender else {
            return false;
        };

        match sender.try_send(LiveEvent::new(event_name, payload)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(user_id, %connection, event = event_name, "Connection backlog full, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(user_id, %connection, "Connection closed before push");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn notifier() -> Arc<Notifier> {
        Arc::new(Notifier::new(PresenceRegistry::default()))
    }

    #[test]
    fn stale_disconnect_keeps_newer_connection() {
        let registry = PresenceRegistry::default();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.register_connection("u1", first);
        registry.register_connection("u1", second);
        registry.unregister_connection(first);

        assert_eq!(registry.connection_for("u1"), Some(second));

        registry.unregister_connection(second);
        assert_eq!(registry.connection_for("u1"), None);
    }

    #[test]
    fn unknown_disconnect_is_a_no_op() {
        let registry = PresenceRegistry::default();
        registry.register_connection("u1", ConnectionId::new());
        registry.unregister_connection(ConnectionId::new());

        assert!(registry.connection_for("u1").is_some());
    }

    #[test]
    fn push_without_connection_is_dropped() {
        assert!(!notifier().push("nobody", "new-message", json!({})));
    }

    #[tokio::test]
    async fn push_reaches_current_connection() {
        let notifier = notifier();
        let mut connection = notifier.connect("u1");

        assert!(notifier.push("u1", LiveEvent::NEW_MESSAGE, json!({"answer": "yes"})));

        let event = connection.events.recv().await.unwrap();
        assert_eq!(event.name, "new-message");
        assert_eq!(event.payload, json!({"answer": "yes"}));
    }

    #[tokio::test]
    async fn reconnect_routes_to_newest_connection() {
        let notifier = notifier();
        let old = notifier.connect("u1");
        let mut new = notifier.connect("u1");

        drop(old);
        assert!(notifier.push("u1", "new-message", json!(1)));
        assert_eq!(new.events.recv().await.unwrap().payload, json!(1));
    }

    #[test]
    fn dropping_connection_unregisters_it() {
        let notifier = notifier();
        let connection = notifier.connect("u1");
        let id = connection.id;
        assert_eq!(notifier.registry().connection_for("u1"), Some(id));

        drop(connection);

        assert_eq!(notifier.registry().connection_for("u1"), None);
        assert!(!notifier.push("u1", "new-message", json!({})));
    }

    #[test]
    fn full_backlog_drops_events() {
        let notifier = notifier();
        let _connection = notifier.connect("u1");

        for i in 0..CHANNEL_CAPACITY {
            assert!(notifier.push("u1", "tick", json!(i)));
        }
        assert!(!notifier.push("u1", "tick", json!("overflow")));
    }
}
