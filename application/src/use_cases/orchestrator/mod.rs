//! Discussion Orchestrator
//!
//! Owns the registry of discussions and exposes the public operations
//! (create, start, inject, stop, read, delete). Each started discussion runs
//! its own [`TurnLoop`] task, which exclusively owns the [`Discussion`]
//! state; callers talk to it only through the stop token and the inbox.
//!
//! ```text
//! CREATED ──start──▶ ACTIVE ──stop──────────▶ STOPPED
//!                      │ ──consensus/max──▶ COMPLETED
//!                      └ ──provider/store──▶ FAILED
//! ```

mod error;
mod turn_loop;


pub use error::DiscussionError;

use crate::broadcast::{BroadcastHub, ConnectionId};
use crate::config::EngineConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::observer::ObserverConnection;
use crate::ports::repository::{DiscussionRepository, DiscussionSnapshot, MessagePage};
use crate::ports::role_supplier::RoleSupplier;
use crate::use_cases::consensus_detector::ConsensusDetector;
use crate::use_cases::speaker_selector::SpeakerSelector;
use conclave_domain::{Discussion, DiscussionId, DiscussionStatus, DomainError, Role};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use turn_loop::TurnLoop;

/// State held before `start` hands the discussion to its loop
struct PendingRun {
    discussion: Discussion,
    inbox: mpsc::UnboundedReceiver<String>,
}

/// Per-discussion control block shared between the registry and the loop
pub(crate) struct DiscussionHandle {
    status: watch::Sender<DiscussionStatus>,
    /// Set by the loop before the final event goes out; the watch channel
    /// only turns terminal after that event is delivered.
    finished: OnceLock<DiscussionStatus>,
    stop: CancellationToken,
    inbox: mpsc::UnboundedSender<String>,
    pending: Mutex<Option<PendingRun>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscussionHandle {
    fn new(discussion: Discussion) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(discussion.status);
        Self {
            status,
            finished: OnceLock::new(),
            stop: CancellationToken::new(),
            inbox: inbox_tx,
            pending: Mutex::new(Some(PendingRun {
                discussion,
                inbox: inbox_rx,
            })),
            task: Mutex::new(None),
        }
    }

    fn current_status(&self) -> DiscussionStatus {
        self.finished
            .get()
            .copied()
            .unwrap_or_else(|| *self.status.borrow())
    }

    pub(crate) fn mark_finished(&self, status: DiscussionStatus) {
        let _ = self.finished.set(status);
    }

    pub(crate) fn publish_status(&self, status: DiscussionStatus) {
        self.status.send_replace(status);
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Runs any number of independent discussions.
pub struct DiscussionOrchestrator<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    repository: Arc<dyn DiscussionRepository>,
    hub: Arc<BroadcastHub>,
    role_supplier: Option<Arc<dyn RoleSupplier>>,
    config: EngineConfig,
    registry: RwLock<HashMap<DiscussionId, Arc<DiscussionHandle>>>,
}

impl<G: LlmGateway + 'static> DiscussionOrchestrator<G> {
    pub fn new(
        gateway: Arc<G>,
        repository: Arc<dyn DiscussionRepository>,
        hub: Arc<BroadcastHub>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            repository,
            hub,
            role_supplier: None,
            config,
            registry: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_role_supplier(mut self, supplier: Arc<dyn RoleSupplier>) -> Self {
        self.role_supplier = Some(supplier);
        self
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn handle(&self, id: DiscussionId) -> Result<Arc<DiscussionHandle>, DiscussionError> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(DiscussionError::NotFound(id))
    }

    // ==================== Lifecycle ====================

    /// Create a discussion in `Created` status.
    ///
    /// `max_turns` defaults to the configured budget.
    pub async fn create(
        &self,
        topic: impl Into<String>,
        roles: Vec<Role>,
        max_turns: Option<u32>,
    ) -> Result<DiscussionSnapshot, DiscussionError> {
        let discussion = Discussion::new(
            topic,
            roles,
            max_turns.unwrap_or(self.config.max_turns),
            self.config.max_roles,
        )?;
        let snapshot = DiscussionSnapshot::from(&discussion);
        self.repository.save_discussion(&snapshot).await?;

        let id = discussion.id;
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(DiscussionHandle::new(discussion)));

        info!(
            discussion = %id.short(),
            roles = snapshot.roles.len(),
            max_turns = snapshot.max_turns,
            "Discussion created"
        );
        Ok(snapshot)
    }

    /// Ask the configured role supplier for a cast, then [`create`](Self::create).
    pub async fn create_from_topic(
        &self,
        topic: impl Into<String>,
        role_count: usize,
        max_turns: Option<u32>,
    ) -> Result<DiscussionSnapshot, DiscussionError> {
        let supplier = self
            .role_supplier
            .as_ref()
            .ok_or(DiscussionError::NoRoleSupplier)?;
        let topic = topic.into();
        let roles = supplier.supply(&topic, role_count).await?;
        self.create(topic, roles, max_turns).await
    }

    /// Begin the turn loop as its own task.
    ///
    /// Starting an `Active` discussion is a no-op.
    pub async fn start(&self, id: DiscussionId) -> Result<(), DiscussionError> {
        let handle = self.handle(id)?;
        let status = handle.current_status();
        if status.is_terminal() {
            return Err(DiscussionError::AlreadyFinished { id, status });
        }

        let Some(PendingRun {
            mut discussion,
            inbox,
        }) = handle
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            debug!(discussion = %id.short(), "Start ignored, already running");
            return Ok(());
        };

        discussion.transition(DiscussionStatus::Active)?;
        if let Err(e) = self
            .repository
            .save_discussion(&DiscussionSnapshot::from(&discussion))
            .await
        {
            discussion.status = DiscussionStatus::Created;
            *handle.pending.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(PendingRun { discussion, inbox });
            return Err(e.into());
        }
        handle.publish_status(DiscussionStatus::Active);

        let turn_loop = TurnLoop {
            discussion,
            inbox,
            handle: Arc::clone(&handle),
            gateway: Arc::clone(&self.gateway),
            repository: Arc::clone(&self.repository),
            hub: Arc::clone(&self.hub),
            selector: SpeakerSelector::new(
                Arc::clone(&self.gateway),
                self.config.selection.clone(),
            ),
            detector: ConsensusDetector::new(
                Arc::clone(&self.gateway),
                self.config.consensus.clone(),
            ),
            config: self.config.clone(),
        };
        let task = tokio::spawn(turn_loop.run());
        *handle.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        info!(discussion = %id.short(), "Discussion started");
        Ok(())
    }

    /// Queue a user message for the next turn boundary.
    pub fn inject_message(
        &self,
        id: DiscussionId,
        content: impl Into<String>,
    ) -> Result<(), DiscussionError> {
        let handle = self.handle(id)?;
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }
        match handle.current_status() {
            DiscussionStatus::Active => handle
                .inbox
                .send(content)
                .map_err(|_| DiscussionError::AlreadyFinished {
                    id,
                    status: handle.current_status(),
                }),
            status if status.is_terminal() => {
                Err(DiscussionError::AlreadyFinished { id, status })
            }
            status => Err(DiscussionError::InvalidStateTransition {
                status,
                operation: "inject a message into",
            }),
        }
    }

    /// Ask the loop to stop at the next turn boundary.
    pub fn request_stop(&self, id: DiscussionId) -> Result<(), DiscussionError> {
        let handle = self.handle(id)?;
        match handle.current_status() {
            DiscussionStatus::Active => {
                info!(discussion = %id.short(), "Stop requested");
                handle.stop.cancel();
                Ok(())
            }
            status if status.is_terminal() => {
                Err(DiscussionError::AlreadyFinished { id, status })
            }
            status => Err(DiscussionError::InvalidStateTransition {
                status,
                operation: "stop",
            }),
        }
    }

    /// Remove the discussion and its observers, stopping it first if active.
    ///
    /// An in-flight provider call is allowed to finish before the loop exits.
    pub async fn delete(&self, id: DiscussionId) -> Result<(), DiscussionError> {
        let handle = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        let Some(handle) = handle else {
            return if self.repository.delete_discussion(id).await? {
                Ok(())
            } else {
                Err(DiscussionError::NotFound(id))
            };
        };

        handle.stop.cancel();
        if let Some(task) = handle.take_task()
            && let Err(e) = task.await
        {
            warn!(discussion = %id.short(), error = %e, "Turn loop task ended abnormally");
        }

        let detached = self.hub.detach_all(id);
        self.repository.delete_discussion(id).await?;
        info!(discussion = %id.short(), detached, "Discussion deleted");
        Ok(())
    }

    /// Stop every active discussion, wait for their loops and close observers
    pub async fn shutdown(&self) {
        let handles: Vec<Arc<DiscussionHandle>> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for handle in &handles {
            handle.stop.cancel();
        }
        for handle in handles {
            if let Some(task) = handle.take_task() {
                let _ = task.await;
            }
        }
        self.hub.close_all().await;
    }

    // ==================== Reads ====================

    /// Persisted metadata of a discussion, in any status
    pub async fn status(&self, id: DiscussionId) -> Result<DiscussionSnapshot, DiscussionError> {
        self.repository
            .load_discussion(id)
            .await?
            .ok_or(DiscussionError::NotFound(id))
    }

    /// Persisted messages, oldest first
    pub async fn read_messages(
        &self,
        id: DiscussionId,
        offset: usize,
        limit: usize,
    ) -> Result<MessagePage, DiscussionError> {
        self.repository
            .list_messages(id, offset, limit)
            .await?
            .ok_or(DiscussionError::NotFound(id))
    }

    /// Receiver that observes every status change of a discussion
    pub fn watch_status(
        &self,
        id: DiscussionId,
    ) -> Result<watch::Receiver<DiscussionStatus>, DiscussionError> {
        Ok(self.handle(id)?.status.subscribe())
    }

    /// Wait until the discussion reaches a terminal status.
    ///
    /// Never returns for a discussion that is not started.
    pub async fn wait_for_completion(
        &self,
        id: DiscussionId,
    ) -> Result<DiscussionStatus, DiscussionError> {
        let mut rx = self.watch_status(id)?;
        let status = rx
            .wait_for(|status| status.is_terminal())
            .await
            .map_err(|_| DiscussionError::NotFound(id))?;
        Ok(*status)
    }

    /// Identifiers of discussions currently `Active`
    pub fn list_active(&self) -> Vec<DiscussionId> {
        let mut ids: Vec<DiscussionId> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, handle)| handle.current_status() == DiscussionStatus::Active)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    // ==================== Observers ====================

    pub fn attach_observer(
        &self,
        id: DiscussionId,
        connection: Arc<dyn ObserverConnection>,
    ) -> Result<ConnectionId, DiscussionError> {
        self.handle(id)?;
        Ok(self.hub.attach(id, connection))
    }

    pub fn detach_observer(&self, id: DiscussionId, connection: ConnectionId) -> bool {
        self.hub.detach(id, connection)
    }
}
