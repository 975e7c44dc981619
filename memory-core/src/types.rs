//! Core data model: users, memories, and their classification enums.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable numeric user identity.
pub type UserId = i64;

/// Reserved identity allocated at bootstrap for any invocation path that
/// is not multi-tenant (e.g. a local CLI). Never usable for interactive
/// login, and user-facing write operations on the multi-tenant surface
/// must reject writes targeting it (I7).
pub const SYSTEM_USER_ID: UserId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Fact,
    Conversation,
    Context,
    Preference,
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fact => "fact",
            Self::Conversation => "conversation",
            Self::Context => "context",
            Self::Preference => "preference",
        };
        write!(f, "{s}")
    }
}

impl MemoryType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fact" => Some(Self::Fact),
            "conversation" => Some(Self::Conversation),
            "context" => Some(Self::Context),
            "preference" => Some(Self::Preference),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Personal,
    Project,
    Business,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Personal => "personal",
            Self::Project => "project",
            Self::Business => "business",
        };
        write!(f, "{s}")
    }
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(Self::Personal),
            "project" => Some(Self::Project),
            "business" => Some(Self::Business),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Literal stored in `content` when the real content lives in
/// `encrypted_content` (I2).
pub const ENCRYPTED_SENTINEL: &str = "[encrypted]";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub user_id: UserId,
    pub memory_type: MemoryType,
    pub category: Category,
    pub content: String,
    pub priority: Priority,
    pub update_key: Option<String>,
    pub tags: Vec<String>,
    pub metadata: serde_json::Value,
    pub embedding: Option<Vec<f32>>,
    pub encrypted_content: Option<serde_json::Value>,
    pub is_encrypted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memory {
    /// I2: the sentinel/encryption-flag/envelope relationship always holds
    /// for a row considered well-formed.
    pub fn invariant_holds(&self) -> bool {
        let sentinel_consistent = self.is_encrypted == (self.content == ENCRYPTED_SENTINEL);
        let envelope_consistent = self.is_encrypted == self.encrypted_content.is_some();
        sentinel_consistent && envelope_consistent
    }
}

/// Fields accepted by store-or-update.
#[derive(Clone, Debug, Default)]
pub struct StoreInput {
    pub content: String,
    pub category: Category,
    pub memory_type: MemoryType,
    pub priority: Priority,
    pub update_key: Option<String>,
    pub tags: Vec<String>,
    pub metadata: serde_json::Value,
}

impl Default for Category {
    fn default() -> Self {
        Self::Personal
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        Self::Fact
    }
}

/// Partial patch accepted by explicit update-by-id . `None` means
/// "leave unchanged"; only non-empty fields overwrite.
#[derive(Clone, Debug, Default)]
pub struct UpdateInput {
    pub content: Option<String>,
    pub category: Option<Category>,
    pub memory_type: Option<MemoryType>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<serde_json::Value>,
}

impl UpdateInput {
    pub fn touches_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A point in a daily memory-creation growth series (GrowthStats).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub date: chrono::NaiveDate,
    pub count: i64,
}

pub type Tags = Vec<String>;
pub type Metadata = HashMap<String, serde_json::Value>;
