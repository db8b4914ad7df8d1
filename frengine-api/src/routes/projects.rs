/// Project endpoints
///
/// Every mutation follows the same order: fetch the live project (404 if
/// absent or tombstoned), check ownership (403), then write. Reads answer
/// conditional GETs from the project's reconciled freshness instant.
///
/// # Endpoints
///
/// - `GET /projects` - List live projects
/// - `POST /projects` - Create a project
/// - `GET /projects/:id` - Fetch a project
/// - `PUT /projects/:id` - Rename or transfer a project (owner only)
/// - `DELETE /projects/:id` - Tombstone a project (owner only)

use crate::{
    app::AppState,
    conditional,
    error::{ApiError, ApiResult},
    routes::auth::{validation_error, SuccessResponse},
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use frengine_shared::{
    auth::{
        authorization::{authorize_create, require_ownership},
        middleware::Identity,
    },
    freshness::{reconcile_many, reconcile_project},
    models::{
        account::User,
        project::{Project, UpdateProject},
    },
    store::{Datastore, ProjectStore, RevisionStore, StoreError},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Project as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub author: User,

    /// Creation time, Unix seconds
    pub created: i64,

    /// Reconciled last-touched time, Unix seconds
    pub modtime: i64,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProjectResponse {
    fn new(project: &Project, modified_at: DateTime<Utc>) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            author: project.owner(),
            created: project.created_at.timestamp(),
            modtime: modified_at.timestamp(),
            created_at: project.created_at,
            modified_at,
        }
    }
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// Owner of the new project; defaults to the caller
    pub author: Option<Uuid>,
}

/// Create project response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    #[serde(rename = "projectID")]
    pub project_id: Uuid,
}

/// Update project request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    /// New owner (ownership transfer)
    pub author: Option<Uuid>,
}

/// Fetches a live project or fails with 404
pub(crate) async fn fetch_project(store: &dyn Datastore, id: Uuid) -> ApiResult<Project> {
    store
        .find_project(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Reconciled freshness of a project, including its latest revision
async fn touched_at(store: &dyn Datastore, project: &Project) -> ApiResult<DateTime<Utc>> {
    let latest = store.latest_revision(project.id).await?;
    Ok(reconcile_project(project, latest.as_ref()))
}

/// Lists live projects
///
/// `Last-Modified` is the latest reconciled instant across the list, or the
/// latest tombstone if a deletion came after it.
pub async fn list_projects(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let store = state.store.as_ref();
    let projects = store.list_projects().await?;

    let mut body = Vec::with_capacity(projects.len());
    for project in &projects {
        let modified_at = touched_at(store, project).await?;
        body.push(ProjectResponse::new(project, modified_at));
    }

    let deleted_at = store.latest_deletion().await?;
    let last_modified = reconcile_many(body.iter().map(|p| p.modified_at).chain(deleted_at));

    Ok(conditional::respond(&headers, last_modified, Json(body)))
}

/// Creates a project
///
/// # Errors
///
/// - `403 Forbidden`: `author` names someone other than the caller
pub async fn create_project(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<CreateProjectResponse>> {
    req.validate().map_err(validation_error)?;

    let owner_id = authorize_create(&identity, req.author)?;
    let project = state.store.create_project(&req.name, owner_id).await?;

    info!(project_id = %project.id, owner_id = %owner_id, "Project created");

    Ok(Json(CreateProjectResponse {
        project_id: project.id,
    }))
}

/// Fetches a project
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let store = state.store.as_ref();
    let project = fetch_project(store, id).await?;
    let modified_at = touched_at(store, &project).await?;

    Ok(conditional::respond(
        &headers,
        Some(modified_at),
        Json(ProjectResponse::new(&project, modified_at)),
    ))
}

/// Renames a project or transfers its ownership
///
/// # Errors
///
/// - `404 Not Found`: no live project with this id
/// - `403 Forbidden`: caller is not the owner
/// - `400 Bad Request`: the new author does not exist
pub async fn update_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    req.validate().map_err(validation_error)?;

    let store = state.store.as_ref();
    let project = fetch_project(store, id).await?;
    require_ownership(&identity, project.owner_id)?;

    let update = UpdateProject {
        name: req.name,
        owner_id: req.author,
    };

    match store.update_project(id, update).await {
        Ok(Some(updated)) => {
            info!(project_id = %id, owner_id = %updated.owner_id, "Project updated");
            Ok(SuccessResponse::ok())
        }
        Ok(None) => Err(ApiError::NotFound("Project not found".to_string())),
        Err(StoreError::ForeignKeyViolation(_)) => Err(ApiError::BadRequest("Invalid author".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Tombstones a project
pub async fn delete_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let store = state.store.as_ref();
    let project = fetch_project(store, id).await?;
    require_ownership(&identity, project.owner_id)?;

    if !store.soft_delete_project(id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    info!(project_id = %id, "Project deleted");

    Ok(SuccessResponse::ok())
}
