/// Storage capabilities
///
/// Each entity gets its own capability trait so callers depend only on what
/// they use. Two backends implement all of them:
///
/// - [`postgres::PgStore`]: the production backend over a sqlx `PgPool`
/// - [`memory::MemoryStore`]: an in-process backend with the same uniqueness,
///   foreign-key and tombstone rules, used by tests and local runs
///
/// Every operation is a single statement. Nothing here retries; a failure is
/// surfaced to the caller immediately.
///
/// # Example
///
/// ```
/// use frengine_shared::store::{memory::MemoryStore, AccountStore, ProjectStore};
///
/// # async fn example() -> Result<(), frengine_shared::store::StoreError> {
/// let store = MemoryStore::new();
/// let alice = store.insert_account("alice", "$argon2id$...").await?;
/// let project = store.create_project("demo", alice.id).await?;
/// assert_eq!(project.owner_id, alice.id);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    account::Account,
    project::{Project, UpdateProject},
    revision::Revision,
};

pub mod memory;
pub mod postgres;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. duplicate account name)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist (e.g. unknown owner or project)
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up an account by its unique name
    async fn find_account_by_name(&self, name: &str) -> StoreResult<Option<Account>>;

    /// Looks up an account by id
    async fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Inserts a new account
    ///
    /// A taken name fails with [`StoreError::UniqueViolation`].
    async fn insert_account(&self, name: &str, password_hash: &str) -> StoreResult<Account>;
}

/// Project persistence
///
/// Reads never return tombstoned projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Lists live projects, oldest first
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Fetches a live project by id
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Creates a project owned by `owner_id`
    ///
    /// An unknown owner fails with [`StoreError::ForeignKeyViolation`].
    async fn create_project(&self, name: &str, owner_id: Uuid) -> StoreResult<Project>;

    /// Applies a metadata update and stamps `metadata_edited_at`
    ///
    /// Returns `None` when the project does not exist or is tombstoned. An
    /// unknown new owner fails with [`StoreError::ForeignKeyViolation`].
    async fn update_project(&self, id: Uuid, update: UpdateProject) -> StoreResult<Option<Project>>;

    /// Tombstones a project
    ///
    /// Returns `false` if there was no live project to delete.
    async fn soft_delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// Most recent tombstone instant across all projects
    ///
    /// Deletions shrink the listing without touching any live row, so the
    /// listing's validator has to account for them separately.
    async fn latest_deletion(&self) -> StoreResult<Option<DateTime<Utc>>>;
}

/// Revision persistence
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Appends a revision to a project
    ///
    /// An unknown or tombstoned project fails with
    /// [`StoreError::ForeignKeyViolation`].
    async fn insert_revision(&self, project_id: Uuid, content: &str) -> StoreResult<Revision>;

    /// Latest revision of a project (greatest `created_at`, then greatest id)
    async fn latest_revision(&self, project_id: Uuid) -> StoreResult<Option<Revision>>;
}

/// The complete storage surface the API server is built on
#[async_trait]
pub trait Datastore: AccountStore + ProjectStore + RevisionStore {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
