/// PostgreSQL storage backend
///
/// Implements every storage capability over a sqlx `PgPool`. Ids are UUID v7
/// generated here rather than by the database, so id order follows creation
/// order and can break `created_at` ties.
///
/// Constraint violations are classified through sqlx's `DatabaseError`
/// helpers so callers can tell "name taken" and "unknown owner" apart from
/// an outage.
///
/// # Example
///
/// ```no_run
/// use frengine_shared::db::pool::{create_pool, DatabaseConfig};
/// use frengine_shared::store::{postgres::PgStore, AccountStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
/// let account = store.find_account_by_name("alice").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, Datastore, ProjectStore, RevisionStore, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    account::Account,
    project::{Project, UpdateProject},
    revision::Revision,
};

/// Column list for project reads, joined with the owner's account
const PROJECT_COLUMNS: &str = "p.id, p.name, p.owner_id, a.name AS owner_name, \
     p.created_at, p.metadata_edited_at, p.deleted_at";

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps constraint violations onto their storage error kinds
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        let constraint = db_err
            .constraint()
            .map(str::to_string)
            .unwrap_or_else(|| db_err.message().to_string());

        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation(constraint);
        }
    }

    StoreError::Database(err)
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_account_by_name(&self, name: &str) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, password_hash, created_at
            FROM accounts
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, password_hash, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn insert_account(&self, name: &str, password_hash: &str) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, password_hash, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS}
             FROM projects p
             INNER JOIN accounts a ON a.id = p.owner_id
             WHERE p.deleted_at IS NULL
             ORDER BY p.created_at, p.id"
        );

        let projects = sqlx::query_as::<_, Project>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(projects)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS}
             FROM projects p
             INNER JOIN accounts a ON a.id = p.owner_id
             WHERE p.id = $1 AND p.deleted_at IS NULL"
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    async fn create_project(&self, name: &str, owner_id: Uuid) -> StoreResult<Project> {
        let query = format!(
            "WITH p AS (
                 INSERT INTO projects (id, name, owner_id)
                 VALUES ($1, $2, $3)
                 RETURNING id, name, owner_id, created_at, metadata_edited_at, deleted_at
             )
             SELECT {PROJECT_COLUMNS}
             FROM p
             INNER JOIN accounts a ON a.id = p.owner_id"
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn update_project(&self, id: Uuid, update: UpdateProject) -> StoreResult<Option<Project>> {
        let query = format!(
            "WITH p AS (
                 UPDATE projects
                 SET name = COALESCE($2, name),
                     owner_id = COALESCE($3, owner_id),
                     metadata_edited_at = NOW()
                 WHERE id = $1 AND deleted_at IS NULL
                 RETURNING id, name, owner_id, created_at, metadata_edited_at, deleted_at
             )
             SELECT {PROJECT_COLUMNS}
             FROM p
             INNER JOIN accounts a ON a.id = p.owner_id"
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(update.name)
            .bind(update.owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn soft_delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn latest_deletion(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(deleted_at) FROM projects")
                .fetch_one(&self.pool)
                .await?;

        Ok(latest)
    }
}

#[async_trait]
impl RevisionStore for PgStore {
    async fn insert_revision(&self, project_id: Uuid, content: &str) -> StoreResult<Revision> {
        // Single statement so a concurrent tombstone cannot slip between
        // the liveness check and the insert
        let revision = sqlx::query_as::<_, Revision>(
            r#"
            INSERT INTO revisions (id, project_id, content)
            SELECT $1, $2, $3
            WHERE EXISTS (
                SELECT 1 FROM projects WHERE id = $2 AND deleted_at IS NULL
            )
            RETURNING id, project_id, content, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(project_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        revision.ok_or_else(|| StoreError::ForeignKeyViolation("revisions_project_id_fkey".to_string()))
    }

    async fn latest_revision(&self, project_id: Uuid) -> StoreResult<Option<Revision>> {
        let revision = sqlx::query_as::<_, Revision>(
            r#"
            SELECT id, project_id, content, created_at
            FROM revisions
            WHERE project_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(revision)
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }
}
