/// Revision model
///
/// Revisions are immutable snapshots appended to a project's history. The
/// latest revision is the one with the greatest `created_at`, ties broken by
/// the greatest id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE revisions (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Stored revision row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Revision {
    /// Unique revision ID (UUID v7, so id order follows insertion order)
    pub id: Uuid,

    /// Project this revision belongs to
    pub project_id: Uuid,

    /// Saved content
    pub content: String,

    /// When the revision was saved
    pub created_at: DateTime<Utc>,
}

impl Revision {
    /// Orders revisions by recency: `created_at`, then id
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn revision(id: Uuid, secs: i64) -> Revision {
        Revision {
            id,
            project_id: Uuid::nil(),
            content: String::new(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_recency_prefers_later_created_at() {
        let older = revision(Uuid::from_u128(9), 100);
        let newer = revision(Uuid::from_u128(1), 200);
        assert_eq!(newer.recency_cmp(&older), Ordering::Greater);
    }

    #[test]
    fn test_recency_ties_broken_by_id() {
        let low = revision(Uuid::from_u128(1), 100);
        let high = revision(Uuid::from_u128(2), 100);
        assert_eq!(high.recency_cmp(&low), Ordering::Greater);
        assert_eq!(low.recency_cmp(&high), Ordering::Less);
    }
}
