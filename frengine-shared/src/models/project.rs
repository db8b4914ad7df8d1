/// Project model
///
/// Projects are owned by exactly one account. Only the owner may rename,
/// transfer, delete or add revisions to a project. Deletion is a tombstone
/// (`deleted_at`); tombstoned rows are excluded from every read.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     owner_id UUID NOT NULL REFERENCES accounts(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     metadata_edited_at TIMESTAMPTZ,
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::User;

/// Project row joined with its owner's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID (UUID v7)
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Owning account
    pub owner_id: Uuid,

    /// Owning account's name (joined from `accounts`)
    pub owner_name: String,

    /// Creation time, always present
    pub created_at: DateTime<Utc>,

    /// Last time name or owner changed (None if never edited)
    pub metadata_edited_at: Option<DateTime<Utc>>,

    /// Tombstone (None while the project is live)
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    /// The owner as a public user reference
    pub fn owner(&self) -> User {
        User {
            id: self.owner_id,
            name: self.owner_name.clone(),
        }
    }

    /// Whether the project has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for updating a project's metadata
///
/// Fields left as `None` keep their current value. Any applied update stamps
/// `metadata_edited_at` with the current time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New owner (ownership transfer)
    pub owner_id: Option<Uuid>,
}
