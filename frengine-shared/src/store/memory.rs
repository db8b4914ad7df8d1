/// In-memory storage backend
///
/// Mirrors the PostgreSQL backend's observable rules without a database:
///
/// - account names are unique
/// - projects and revisions must reference existing rows
/// - tombstoned projects are invisible to reads and updates and accept no
///   new revisions
/// - the latest revision is chosen by `created_at`, then id
///
/// State sits behind a single tokio `RwLock`; each trait method takes the
/// lock once, which gives the same per-statement atomicity the relational
/// backend provides.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, Datastore, ProjectStore, RevisionStore, StoreError, StoreResult};
use crate::models::{
    account::Account,
    project::{Project, UpdateProject},
    revision::Revision,
};

/// Project row as stored, without the joined owner name
#[derive(Debug, Clone)]
struct ProjectRecord {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    metadata_edited_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    projects: HashMap<Uuid, ProjectRecord>,
    revisions: Vec<Revision>,
}

impl Tables {
    /// Joins a project record with its owner, hiding tombstones
    fn live_project(&self, record: &ProjectRecord) -> Option<Project> {
        if record.deleted_at.is_some() {
            return None;
        }

        let owner = self.accounts.get(&record.owner_id)?;

        Some(Project {
            id: record.id,
            name: record.name.clone(),
            owner_id: record.owner_id,
            owner_name: owner.name.clone(),
            created_at: record.created_at,
            metadata_edited_at: record.metadata_edited_at,
            deleted_at: record.deleted_at,
        })
    }

    fn require_account(&self, id: Uuid) -> StoreResult<()> {
        if self.accounts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation("projects_owner_id_fkey".to_string()))
        }
    }
}

/// In-process store for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_name(&self, name: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.name == name).cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.get(&id).cloned())
    }

    async fn insert_account(&self, name: &str, password_hash: &str) -> StoreResult<Account> {
        let mut tables = self.tables.write().await;

        if tables.accounts.values().any(|a| a.name == name) {
            return Err(StoreError::UniqueViolation("accounts_name_key".to_string()));
        }

        let account = Account {
            id: Uuid::now_v7(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());

        Ok(account)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;

        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter_map(|record| tables.live_project(record))
            .collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(projects)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).and_then(|record| tables.live_project(record)))
    }

    async fn create_project(&self, name: &str, owner_id: Uuid) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        tables.require_account(owner_id)?;

        let record = ProjectRecord {
            id: Uuid::now_v7(),
            name: name.to_string(),
            owner_id,
            created_at: Utc::now(),
            metadata_edited_at: None,
            deleted_at: None,
        };
        tables.projects.insert(record.id, record.clone());

        tables
            .live_project(&record)
            .ok_or_else(|| StoreError::ForeignKeyViolation("projects_owner_id_fkey".to_string()))
    }

    async fn update_project(&self, id: Uuid, update: UpdateProject) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;

        if let Some(owner_id) = update.owner_id {
            tables.require_account(owner_id)?;
        }

        let Some(record) = tables.projects.get_mut(&id).filter(|r| r.deleted_at.is_none()) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(owner_id) = update.owner_id {
            record.owner_id = owner_id;
        }
        record.metadata_edited_at = Some(Utc::now());

        let record = record.clone();
        Ok(tables.live_project(&record))
    }

    async fn soft_delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        match tables.projects.get_mut(&id) {
            Some(record) if record.deleted_at.is_none() => {
                record.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn latest_deletion(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.values().filter_map(|r| r.deleted_at).max())
    }
}

#[async_trait]
impl RevisionStore for MemoryStore {
    async fn insert_revision(&self, project_id: Uuid, content: &str) -> StoreResult<Revision> {
        let mut tables = self.tables.write().await;

        let live = tables
            .projects
            .get(&project_id)
            .is_some_and(|r| r.deleted_at.is_none());
        if !live {
            return Err(StoreError::ForeignKeyViolation(
                "revisions_project_id_fkey".to_string(),
            ));
        }

        let revision = Revision {
            id: Uuid::now_v7(),
            project_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.revisions.push(revision.clone());

        Ok(revision)
    }

    async fn latest_revision(&self, project_id: Uuid) -> StoreResult<Option<Revision>> {
        let tables = self.tables.read().await;

        Ok(tables
            .revisions
            .iter()
            .filter(|r| r.project_id == project_id)
            .max_by(|a, b| a.recency_cmp(b))
            .cloned())
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_account_names_are_unique() {
        let store = MemoryStore::new();
        let first = store.insert_account("alice", "hash-1").await.unwrap();

        let second = store.insert_account("alice", "hash-2").await;
        assert!(matches!(second, Err(StoreError::UniqueViolation(_))));

        let found = store.find_account_by_name("alice").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.password_hash, "hash-1");
    }

    #[tokio::test]
    async fn test_create_project_requires_owner() {
        let store = MemoryStore::new();
        let result = store.create_project("orphan", Uuid::now_v7()).await;
        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_update_stamps_metadata_edit() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let project = store.create_project("draft", alice.id).await.unwrap();
        assert!(project.metadata_edited_at.is_none());

        let updated = store
            .update_project(
                project.id,
                UpdateProject {
                    name: Some("final".to_string()),
                    owner_id: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "final");
        assert_eq!(updated.owner_id, alice.id);
        assert!(updated.metadata_edited_at.unwrap() >= project.created_at);
    }

    #[tokio::test]
    async fn test_update_transfers_ownership() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let bob = store.insert_account("bob", "h").await.unwrap();
        let project = store.create_project("shared", alice.id).await.unwrap();

        let updated = store
            .update_project(
                project.id,
                UpdateProject {
                    name: None,
                    owner_id: Some(bob.id),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.owner_id, bob.id);
        assert_eq!(updated.owner_name, "bob");

        let unknown = store
            .update_project(
                project.id,
                UpdateProject {
                    name: None,
                    owner_id: Some(Uuid::now_v7()),
                },
            )
            .await;
        assert!(matches!(unknown, Err(StoreError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_project() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let project = store.create_project("gone", alice.id).await.unwrap();

        assert!(store.soft_delete_project(project.id).await.unwrap());
        assert!(!store.soft_delete_project(project.id).await.unwrap());

        assert!(store.find_project(project.id).await.unwrap().is_none());
        assert!(store.list_projects().await.unwrap().is_empty());

        let update = store
            .update_project(project.id, UpdateProject::default())
            .await
            .unwrap();
        assert!(update.is_none());
    }

    #[tokio::test]
    async fn test_latest_revision() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let project = store.create_project("doc", alice.id).await.unwrap();

        assert!(store.latest_revision(project.id).await.unwrap().is_none());

        store.insert_revision(project.id, "v1").await.unwrap();
        let second = store.insert_revision(project.id, "v2").await.unwrap();

        let latest = store.latest_revision(project.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.content, "v2");
    }

    #[tokio::test]
    async fn test_revision_requires_project() {
        let store = MemoryStore::new();
        let result = store.insert_revision(Uuid::now_v7(), "x").await;
        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_tombstoned_project_rejects_revisions() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let project = store.create_project("doc", alice.id).await.unwrap();
        assert!(store.soft_delete_project(project.id).await.unwrap());

        let result = store.insert_revision(project.id, "after delete").await;
        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
        assert!(store.latest_revision(project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_deletion() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let kept = store.create_project("kept", alice.id).await.unwrap();
        let dropped = store.create_project("dropped", alice.id).await.unwrap();

        assert!(store.latest_deletion().await.unwrap().is_none());

        store.soft_delete_project(dropped.id).await.unwrap();
        let deleted_at = store.latest_deletion().await.unwrap().unwrap();
        assert!(deleted_at >= kept.created_at);
        assert!(deleted_at >= dropped.created_at);
    }

    #[tokio::test]
    async fn test_list_projects_in_creation_order() {
        let store = MemoryStore::new();
        let alice = store.insert_account("alice", "h").await.unwrap();
        let first = store.create_project("one", alice.id).await.unwrap();
        let second = store.create_project("two", alice.id).await.unwrap();

        let ids: Vec<Uuid> = store.list_projects().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
