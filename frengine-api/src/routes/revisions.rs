/// Revision endpoints
///
/// Revisions are append-only. Reading returns only the latest one, and its
/// freshness is the whole project's reconciled instant, so a rename also
/// invalidates a cached revision.
///
/// # Endpoints
///
/// - `GET /projects/:id/revision` - Latest revision
/// - `POST /projects/:id/revision` - Append a revision (owner only); the raw
///   request body is the content

use crate::{
    app::AppState,
    conditional,
    error::{ApiError, ApiResult},
    routes::projects::fetch_project,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use frengine_shared::{
    auth::{authorization::require_ownership, middleware::Identity},
    freshness::reconcile_project,
    models::revision::Revision,
    store::{RevisionStore, StoreError},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Revision as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionResponse {
    pub id: Uuid,
    pub content: String,

    /// Creation time, Unix seconds
    pub created: i64,

    pub created_at: DateTime<Utc>,
}

impl From<Revision> for RevisionResponse {
    fn from(revision: Revision) -> Self {
        Self {
            id: revision.id,
            content: revision.content,
            created: revision.created_at.timestamp(),
            created_at: revision.created_at,
        }
    }
}

/// Fetches the latest revision of a project
///
/// # Errors
///
/// - `404 Not Found`: no live project, or no revision yet
pub async fn latest_revision(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = state.store.as_ref();
    let project = fetch_project(store, id).await?;

    let revision = store
        .latest_revision(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project has no revisions".to_string()))?;

    let modified_at = reconcile_project(&project, Some(&revision));

    Ok(conditional::respond(
        &headers,
        Some(modified_at),
        Json(RevisionResponse::from(revision)),
    ))
}

/// Appends a revision
pub async fn save_revision(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    content: String,
) -> ApiResult<Json<RevisionResponse>> {
    let store = state.store.as_ref();
    let project = fetch_project(store, id).await?;
    require_ownership(&identity, project.owner_id)?;

    let revision = store.insert_revision(id, &content).await.map_err(|e| match e {
        StoreError::ForeignKeyViolation(_) => ApiError::NotFound("Project not found".to_string()),
        other => other.into(),
    })?;

    info!(project_id = %id, revision_id = %revision.id, "Revision saved");

    Ok(Json(RevisionResponse::from(revision)))
}
