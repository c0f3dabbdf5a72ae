//! Persistence port
//!
//! Every message and status change the turn loop produces is handed to a
//! [`DiscussionRepository`] before it counts as committed. Historical reads
//! (status, paginated messages) are served from here, never by replaying
//! broadcast events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conclave_domain::{ConsensusResult, Discussion, DiscussionId, DiscussionStatus, Message, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Discussion not found: {0}")]
    NotFound(DiscussionId),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Discussion metadata without the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionSnapshot {
    pub id: DiscussionId,
    pub topic: String,
    pub status: DiscussionStatus,
    pub roles: Vec<Role>,
    pub current_turn: u32,
    pub max_turns: u32,
    pub consensus: Option<ConsensusResult>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Discussion> for DiscussionSnapshot {
    fn from(discussion: &Discussion) -> Self {
        Self {
            id: discussion.id,
            topic: discussion.topic.clone(),
            status: discussion.status,
            roles: discussion.roles.clone(),
            current_turn: discussion.current_turn,
            max_turns: discussion.max_turns,
            consensus: discussion.consensus.clone(),
            message_count: discussion.messages.len(),
            created_at: discussion.created_at,
            updated_at: discussion.updated_at,
        }
    }
}

/// One page of a transcript, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePage {
    pub discussion_id: DiscussionId,
    pub messages: Vec<Message>,
    pub offset: usize,
    pub limit: usize,
    /// Total number of messages in the transcript
    pub total: usize,
}

impl MessagePage {
    pub fn has_more(&self) -> bool {
        self.offset + self.messages.len() < self.total
    }
}

#[async_trait]
pub trait DiscussionRepository: Send + Sync {
    /// Insert or replace the discussion metadata (status, turn, consensus)
    async fn save_discussion(&self, snapshot: &DiscussionSnapshot) -> Result<(), RepositoryError>;

    /// Append one message to a saved discussion's transcript
    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError>;

    async fn load_discussion(
        &self,
        id: DiscussionId,
    ) -> Result<Option<DiscussionSnapshot>, RepositoryError>;

    /// Messages `[offset, offset + limit)`, or `None` for an unknown id
    async fn list_messages(
        &self,
        id: DiscussionId,
        offset: usize,
        limit: usize,
    ) -> Result<Option<MessagePage>, RepositoryError>;

    /// Returns whether anything was removed
    async fn delete_discussion(&self, id: DiscussionId) -> Result<bool, RepositoryError>;
}

#[derive(Debug)]
struct StoredDiscussion {
    snapshot: DiscussionSnapshot,
    messages: Vec<Message>,
}

/// Process-local repository, the default store.
#[derive(Debug, Default)]
pub struct InMemoryDiscussionRepository {
    discussions: RwLock<HashMap<DiscussionId, StoredDiscussion>>,
}

impl InMemoryDiscussionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.discussions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.discussions.read().await.is_empty()
    }
}

#[async_trait]
impl DiscussionRepository for InMemoryDiscussionRepository {
    async fn save_discussion(&self, snapshot: &DiscussionSnapshot) -> Result<(), RepositoryError> {
        let mut discussions = self.discussions.write().await;
        match discussions.get_mut(&snapshot.id) {
            Some(stored) => {
                stored.snapshot = snapshot.clone();
                stored.snapshot.message_count = stored.messages.len();
            }
            None => {
                discussions.insert(
                    snapshot.id,
                    StoredDiscussion {
                        snapshot: DiscussionSnapshot {
                            message_count: 0,
                            ..snapshot.clone()
                        },
                        messages: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut discussions = self.discussions.write().await;
        let stored = discussions
            .get_mut(&message.discussion_id)
            .ok_or(RepositoryError::NotFound(message.discussion_id))?;
        stored.messages.push(message.clone());
        stored.snapshot.message_count = stored.messages.len();
        Ok(())
    }

    async fn load_discussion(
        &self,
        id: DiscussionId,
    ) -> Result<Option<DiscussionSnapshot>, RepositoryError> {
        Ok(self
            .discussions
            .read()
            .await
            .get(&id)
            .map(|stored| stored.snapshot.clone()))
    }

    async fn list_messages(
        &self,
        id: DiscussionId,
        offset: usize,
        limit: usize,
    ) -> Result<Option<MessagePage>, RepositoryError> {
        let discussions = self.discussions.read().await;
        Ok(discussions.get(&id).map(|stored| MessagePage {
            discussion_id: id,
            messages: stored
                .messages
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
            offset,
            limit,
            total: stored.messages.len(),
        }))
    }

    async fn delete_discussion(&self, id: DiscussionId) -> Result<bool, RepositoryError> {
        Ok(self.discussions.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discussion() -> Discussion {
        let roles = vec![Role::new("A", "m", "p"), Role::new("B", "m", "p")];
        Discussion::new("Topic", roles, 4, 8).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let repo = InMemoryDiscussionRepository::new();
        let d = discussion();
        repo.save_discussion(&DiscussionSnapshot::from(&d))
            .await
            .unwrap();

        let loaded = repo.load_discussion(d.id).await.unwrap().unwrap();
        assert_eq!(loaded.topic, "Topic");
        assert_eq!(loaded.status, DiscussionStatus::Created);
        assert_eq!(loaded.message_count, 0);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_append_and_paginate() {
        let repo = InMemoryDiscussionRepository::new();
        let mut d = discussion();
        repo.save_discussion(&DiscussionSnapshot::from(&d))
            .await
            .unwrap();
        d.transition(DiscussionStatus::Active).unwrap();
        for (i, name) in ["A", "B", "A"].iter().enumerate() {
            let msg = d
                .append_agent_message(name, format!("point {}", i))
                .unwrap()
                .clone();
            repo.append_message(&msg).await.unwrap();
        }

        let page = repo.list_messages(d.id, 1, 1).await.unwrap().unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].content, "point 1");
        assert!(page.has_more());

        let tail = repo.list_messages(d.id, 2, 10).await.unwrap().unwrap();
        assert_eq!(tail.messages.len(), 1);
        assert!(!tail.has_more());

        let past_end = repo.list_messages(d.id, 10, 10).await.unwrap().unwrap();
        assert!(past_end.messages.is_empty());
        assert_eq!(past_end.total, 3);
    }

    #[tokio::test]
    async fn test_resave_keeps_message_count() {
        let repo = InMemoryDiscussionRepository::new();
        let mut d = discussion();
        repo.save_discussion(&DiscussionSnapshot::from(&d))
            .await
            .unwrap();
        d.transition(DiscussionStatus::Active).unwrap();
        let msg = d.append_agent_message("A", "hello").unwrap().clone();
        repo.append_message(&msg).await.unwrap();

        let mut snapshot = DiscussionSnapshot::from(&d);
        snapshot.message_count = 99;
        repo.save_discussion(&snapshot).await.unwrap();
        let loaded = repo.load_discussion(d.id).await.unwrap().unwrap();
        assert_eq!(loaded.message_count, 1);
        assert_eq!(loaded.status, DiscussionStatus::Active);
    }

    #[tokio::test]
    async fn test_unknown_discussion() {
        let repo = InMemoryDiscussionRepository::new();
        let id = DiscussionId::new();
        assert!(repo.load_discussion(id).await.unwrap().is_none());
        assert!(repo.list_messages(id, 0, 10).await.unwrap().is_none());
        assert!(!repo.delete_discussion(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryDiscussionRepository::new();
        let d = discussion();
        repo.save_discussion(&DiscussionSnapshot::from(&d))
            .await
            .unwrap();
        assert!(repo.delete_discussion(d.id).await.unwrap());
        assert!(repo.is_empty().await);
    }

    #[test]
    fn test_snapshot_serializes_for_external_stores() {
        let d = discussion();
        let value = serde_json::to_value(DiscussionSnapshot::from(&d)).unwrap();
        assert_eq!(value["status"], "created");
        assert_eq!(value["roles"][0]["name"], "A");
        assert!(value["consensus"].is_null());

        let back: DiscussionSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, d.id);
    }
}
