//! Broadcast Hub
//!
//! Keeps, per discussion, the set of live [`ObserverConnection`]s and
//! delivers each event to all of them.
//!
//! - Delivery is fire-and-forget: a failing or slow connection is removed
//!   and the remaining connections still receive the event.
//! - Emission never fails from the caller's point of view.
//! - Events reach a single connection in emission order because the turn
//!   loop awaits each `emit` before producing the next event.
//! - Each discussion has its own guarded set, so attaching to one
//!   discussion never waits on another's delivery.
//! - Locks are always taken map first, then set. Adding to a set and
//!   pruning an empty one both happen under the map's write lock.

use crate::ports::observer::{DeliveryError, ObserverConnection};
use conclave_domain::{DiscussionEvent, DiscussionId};
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Handle returned by [`BroadcastHub::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

type ConnectionSet = Vec<(ConnectionId, Arc<dyn ObserverConnection>)>;

pub struct BroadcastHub {
    discussions: RwLock<HashMap<DiscussionId, Arc<Mutex<ConnectionSet>>>>,
    next_id: AtomicU64,
    delivery_timeout: Duration,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl BroadcastHub {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            discussions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            delivery_timeout,
        }
    }

    fn set_for(&self, id: DiscussionId) -> Option<Arc<Mutex<ConnectionSet>>> {
        self.discussions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Add a connection to a discussion's live set
    pub fn attach(&self, id: DiscussionId, connection: Arc<dyn ObserverConnection>) -> ConnectionId {
        let conn_id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let label = connection.label();
        {
            // Push under the map lock so `prune` cannot drop the set in between
            let mut discussions = self
                .discussions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            discussions
                .entry(id)
                .or_default()
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((conn_id, connection));
        }
        debug!(discussion = %id.short(), connection = %conn_id, label, "Observer attached");
        conn_id
    }

    /// Remove one connection. Unknown ids are ignored.
    pub fn detach(&self, id: DiscussionId, conn_id: ConnectionId) -> bool {
        let Some(set) = self.set_for(id) else {
            return false;
        };
        let removed = {
            let mut connections = set.lock().unwrap_or_else(PoisonError::into_inner);
            let before = connections.len();
            connections.retain(|(cid, _)| *cid != conn_id);
            before != connections.len()
        };
        self.prune(id);
        if removed {
            debug!(discussion = %id.short(), connection = %conn_id, "Observer detached");
        }
        removed
    }

    /// Drop every connection of a discussion, returning how many were removed
    pub fn detach_all(&self, id: DiscussionId) -> usize {
        let removed = self
            .discussions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        removed
            .map(|set| set.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    /// Forget a discussion's set once it is empty
    fn prune(&self, id: DiscussionId) {
        let mut discussions = self.discussions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = discussions.get(&id)
            && set.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
        {
            discussions.remove(&id);
        }
    }

    /// Deliver `event` to every live connection of its discussion.
    ///
    /// Returns the number of successful deliveries. Connections that fail
    /// or exceed the delivery timeout are removed.
    pub async fn emit(&self, event: &DiscussionEvent) -> usize {
        let id = event.discussion_id();
        let Some(set) = self.set_for(id) else {
            return 0;
        };
        let targets: ConnectionSet = set.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if targets.is_empty() {
            return 0;
        }

        let deliveries = targets.iter().map(|(conn_id, connection)| async move {
            let result =
                match tokio::time::timeout(self.delivery_timeout, connection.deliver(event)).await {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Timeout),
                };
            (*conn_id, result)
        });
        let results = join_all(deliveries).await;

        let failed: Vec<ConnectionId> = results
            .iter()
            .filter_map(|(conn_id, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        discussion = %id.short(),
                        connection = %conn_id,
                        event = event.event_type(),
                        error = %e,
                        "Dropping observer after failed delivery"
                    );
                    Some(*conn_id)
                }
            })
            .collect();

        if !failed.is_empty() {
            set.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(cid, _)| !failed.contains(cid));
            self.prune(id);
        }

        results.len() - failed.len()
    }

    // ==================== Introspection ====================

    pub fn connection_count(&self, id: DiscussionId) -> usize {
        self.set_for(id)
            .map(|set| set.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        self.discussions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|set| set.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Discussions that currently have at least one observer
    pub fn active_discussions(&self) -> Vec<DiscussionId> {
        let mut ids: Vec<DiscussionId> = self
            .discussions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Close and drop every connection
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Mutex<ConnectionSet>>> = self
            .discussions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, set)| set)
            .collect();

        let connections: Vec<Arc<dyn ObserverConnection>> = drained
            .iter()
            .flat_map(|set| {
                std::mem::take(&mut *set.lock().unwrap_or_else(PoisonError::into_inner))
            })
            .map(|(_, connection)| connection)
            .collect();

        debug!(count = connections.len(), "Closing all observers");
        join_all(connections.iter().map(|c| c.close())).await;
    }
}
