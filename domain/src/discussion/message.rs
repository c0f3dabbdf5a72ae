//! Transcript messages

use super::entities::DiscussionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Who authored a message.
///
/// Serialized as a plain string: the role name, or `"user"` for messages
/// injected from outside the panel. `"user"` is therefore not a valid role name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Speaker {
    Role(String),
    User,
}

impl Speaker {
    /// Sentinel name used for injected messages
    pub const USER: &'static str = "user";

    pub fn as_str(&self) -> &str {
        match self {
            Speaker::Role(name) => name,
            Speaker::User => Self::USER,
        }
    }

    /// Role name, if this speaker is a panel member
    pub fn role_name(&self) -> Option<&str> {
        match self {
            Speaker::Role(name) => Some(name),
            Speaker::User => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Speaker::User)
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Speaker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Speaker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(if s == Self::USER {
            Speaker::User
        } else {
            Speaker::Role(s)
        })
    }
}

/// A single transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sequence number within the discussion (1-indexed, append order)
    pub id: u64,
    /// Back-reference to the owning discussion
    pub discussion_id: DiscussionId,
    /// Turn this message belongs to
    pub turn: u32,
    pub speaker: Speaker,
    /// Model that generated the content (`None` for user messages)
    pub model: Option<String>,
    pub content: String,
    /// Role names referenced with `@Name`, in order of appearance
    pub mentions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Role name of the author, if a panel member wrote it
    pub fn author_role(&self) -> Option<&str> {
        self.speaker.role_name()
    }

    pub fn is_user(&self) -> bool {
        self.speaker.is_user()
    }
}
