use std::{collections::HashSet, sync::Arc};

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::query::ListQuery;
use crate::{
    auth::{RoleAssign, RoleCreate, RoleDelete, RoleList, RoleShow, RoleUpdate},
    db::dao::{NewPermission, PaginatedResponse},
    db::entities::role_assignment,
    response::{ApiResult, JsonApiResponse},
    routes::Authorized,
    services::{
        ServiceContext,
        role_service::{AssignmentQuery, AssignmentView, RoleInput, RoleQuery, RoleWithPermissions},
    },
    state::AppState,
    validation::{Validate, ValidatedJson, Validator, max_len, required},
};

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub subject: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    #[serde(default)]
    pub is_manage_all: bool,
    #[serde(default)]
    pub guard_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionRequest>,
}

impl Validate for RoleRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("name", required("name", &self.name))
            .check("name", max_len("name", self.name.trim(), 100));

        let mut seen = HashSet::new();
        for (idx, perm) in self.permissions.iter().enumerate() {
            let subject = format!("permissions.{idx}.subject");
            let action = format!("permissions.{idx}.action");
            v.check(&subject, required("subject", &perm.subject))
                .check(&action, required("action", &perm.action));
            if !seen.insert((perm.subject.trim(), perm.action.trim())) {
                v.check(
                    &format!("permissions.{idx}"),
                    Err("permission is listed more than once".to_string()),
                );
            }
        }
    }
}

impl From<RoleRequest> for RoleInput {
    fn from(body: RoleRequest) -> Self {
        Self {
            name: body.name,
            is_manage_all: body.is_manage_all,
            guard_name: body
                .guard_name
                .map(|guard| guard.trim().to_string())
                .filter(|guard| !guard.is_empty()),
            permissions: body
                .permissions
                .into_iter()
                .map(|perm| NewPermission {
                    subject: perm.subject.trim().to_string(),
                    action: perm.action.trim().to_string(),
                    description: perm.description,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

impl Validate for AssignRoleRequest {
    fn validate(&self, v: &mut Validator) {
        if self.user_id.is_nil() {
            v.check("userId", Err("userId should not be empty".to_string()));
        }
        if self.role_id.is_nil() {
            v.check("roleId", Err("roleId should not be empty".to_string()));
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedRole {
    pub id: Uuid,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/role", post(create_role).get(list_roles))
        .route("/role/assign", post(assign_role))
        .route("/role/assign/list", get(list_assignments))
        .route(
            "/role/{id}",
            get(show_role).put(update_role).delete(delete_role),
        )
        .with_state(state)
}

async fn create_role(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleCreate>,
    ValidatedJson(body): ValidatedJson<RoleRequest>,
) -> ApiResult<RoleWithPermissions> {
    let role = ServiceContext::from_state(state.as_ref())
        .role()
        .create(body.into())
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "Role created successfully", role)
}

async fn list_roles(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleList>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<RoleWithPermissions>> {
    let roles = ServiceContext::from_state(state.as_ref())
        .role()
        .list(RoleQuery {
            search: query.search,
            page: query.page,
            limit: query.limit,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Roles retrieved successfully", roles)
}

async fn show_role(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleShow>,
    Path(id): Path<Uuid>,
) -> ApiResult<RoleWithPermissions> {
    let role = ServiceContext::from_state(state.as_ref())
        .role()
        .find(id)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Role retrieved successfully", role)
}

async fn update_role(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<RoleRequest>,
) -> ApiResult<RoleWithPermissions> {
    let role = ServiceContext::from_state(state.as_ref())
        .role()
        .update(id, body.into())
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Role updated successfully", role)
}

async fn delete_role(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleDelete>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedRole> {
    let id = ServiceContext::from_state(state.as_ref())
        .role()
        .delete(id)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Role removed successfully", DeletedRole { id })
}

async fn assign_role(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleAssign>,
    ValidatedJson(body): ValidatedJson<AssignRoleRequest>,
) -> ApiResult<role_assignment::Model> {
    let assignment = ServiceContext::from_state(state.as_ref())
        .role()
        .assign(body.user_id, body.role_id)
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "Role assigned successfully", assignment)
}

async fn list_assignments(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<RoleList>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<AssignmentView>> {
    let assignments = ServiceContext::from_state(state.as_ref())
        .role()
        .list_assignments(AssignmentQuery {
            user_id: query.user_id,
            role_id: query.role_id,
            page: query.page,
            limit: query.limit,
        })
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Role assignments retrieved successfully",
        assignments,
    )
}
