//! Resource subscriptions and the change notifications they produce

use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;
use rust_mcp_sdk::schema::{ResourceUpdatedNotification, ResourceUpdatedNotificationParams};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

const NOTIFICATION_BUFFER: usize = 256;

/// Tracks which resource uris the client subscribed to and fans out
/// `notifications/resources/updated` for them. Clones share state.
#[derive(Clone)]
pub struct ResourceEvents {
    tx: broadcast::Sender<Value>,
    subscribed: Arc<RwLock<HashSet<String>>>,
}

impl ResourceEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self {
            tx,
            subscribed: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Returns `false` when the uri was already subscribed.
    pub fn subscribe(&self, uri: &str) -> bool {
        self.subscribed.write().insert(uri.to_string())
    }

    /// Returns `false` when the uri was not subscribed.
    pub fn unsubscribe(&self, uri: &str) -> bool {
        self.subscribed.write().remove(uri)
    }

    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.subscribed.read().contains(uri)
    }

    pub fn listen(&self) -> broadcast::Receiver<Value> {
        self.tx.subscribe()
    }

    /// Announces a change to `uri` if the client asked to hear about it.
    pub fn resource_updated(&self, uri: &str) {
        if !self.is_subscribed(uri) {
            return;
        }

        let notification = ResourceUpdatedNotification::new(ResourceUpdatedNotificationParams {
            meta: None,
            uri: uri.to_string(),
        });
        let payload = serde_json::to_value(notification)
            .expect("resource updated notification serialization");

        if self.tx.send(payload).is_err() {
            debug!(uri = %uri, "no listener for resource update");
        }
    }
}

impl Default for ResourceEvents {
    fn default() -> Self {
        Self::new()
    }
}
