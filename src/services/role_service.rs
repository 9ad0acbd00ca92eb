use std::collections::HashMap;

use sea_orm::Set;
use serde::Serialize;
use uuid::Uuid;

use super::context::{ServiceContext, commit};
use crate::{
    db::dao::{DaoBase, DaoLayerError, NewPermission, PaginatedResponse},
    db::entities::{permission, role, role_assignment, user},
    error::AppError,
};

#[derive(Debug, Clone)]
pub struct RoleInput {
    pub name: String,
    pub is_manage_all: bool,
    pub guard_name: Option<String>,
    pub permissions: Vec<NewPermission>,
}

#[derive(Debug, Clone)]
pub struct RoleQuery {
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct AssignmentQuery {
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: role::Model,
    pub permissions: Vec<permission::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignedUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignedRole {
    pub name: String,
    pub is_manage_all: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: role_assignment::Model,
    pub user: Option<AssignedUser>,
    pub role: Option<AssignedRole>,
}

fn role_conflict(err: DaoLayerError) -> AppError {
    match err {
        DaoLayerError::Duplicate { .. } => AppError::conflict("Role name already exists"),
        other => other.into(),
    }
}

fn role_not_found() -> AppError {
    AppError::not_found("Role not found")
}

fn trimmed(search: Option<String>) -> Option<String> {
    search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
}

/// Roles, their permission sets and user assignments. Every multi-row write
/// runs in a single transaction so readers see the old or the new state only.
#[derive(Clone)]
pub struct RoleService {
    services: ServiceContext,
}

impl RoleService {
    pub fn new(services: ServiceContext) -> Self {
        Self { services }
    }

    pub async fn create(&self, input: RoleInput) -> Result<RoleWithPermissions, AppError> {
        let daos = self.services.daos();
        let model = role::ActiveModel {
            name: Set(input.name.trim().to_string()),
            is_manage_all: Set(input.is_manage_all),
            guard_name: Set(input.guard_name),
            ..Default::default()
        };

        let txn = self.services.begin().await?;
        let role = daos
            .role()
            .create_on(&txn, model)
            .await
            .map_err(role_conflict)?;
        let permissions = daos
            .permission()
            .insert_for_role_on(&txn, role.id, input.permissions)
            .await?;
        commit(txn).await?;
        tracing::info!(role_id = %role.id, permissions = permissions.len(), "role created");

        Ok(RoleWithPermissions { role, permissions })
    }

    /// Scalar fields are overwritten and the permission set is replaced as a
    /// whole.
    pub async fn update(&self, id: Uuid, input: RoleInput) -> Result<RoleWithPermissions, AppError> {
        let daos = self.services.daos();
        daos.role().find_optional(id).await?.ok_or_else(role_not_found)?;

        let name = input.name.trim().to_string();
        let is_manage_all = input.is_manage_all;
        let guard_name = input.guard_name;

        let txn = self.services.begin().await?;
        let role = daos
            .role()
            .update_on(&txn, id, move |active| {
                active.name = Set(name);
                active.is_manage_all = Set(is_manage_all);
                active.guard_name = Set(guard_name);
            })
            .await
            .map_err(role_conflict)?;
        daos.permission().delete_by_role_on(&txn, id).await?;
        let permissions = daos
            .permission()
            .insert_for_role_on(&txn, id, input.permissions)
            .await?;
        commit(txn).await?;
        tracing::info!(role_id = %id, permissions = permissions.len(), "role updated");

        Ok(RoleWithPermissions { role, permissions })
    }

    /// Removes the role with its permissions and every assignment pointing at
    /// it.
    pub async fn delete(&self, id: Uuid) -> Result<Uuid, AppError> {
        let daos = self.services.daos();
        daos.role().find_optional(id).await?.ok_or_else(role_not_found)?;

        let txn = self.services.begin().await?;
        daos.permission().delete_by_role_on(&txn, id).await?;
        let unassigned = daos.assignment().delete_by_role_on(&txn, id).await?;
        daos.role().delete_on(&txn, id).await?;
        commit(txn).await?;
        tracing::info!(role_id = %id, unassigned, "role deleted");

        Ok(id)
    }

    pub async fn find(&self, id: Uuid) -> Result<RoleWithPermissions, AppError> {
        let daos = self.services.daos();
        let role = daos.role().find_optional(id).await?.ok_or_else(role_not_found)?;
        let permissions = daos.permission().find_by_role(id).await?;
        Ok(RoleWithPermissions { role, permissions })
    }

    /// `search` matches the role name, the guard name, or any subject/action
    /// in the role's permission set.
    pub async fn list(
        &self,
        query: RoleQuery,
    ) -> Result<PaginatedResponse<RoleWithPermissions>, AppError> {
        let daos = self.services.daos();
        let search = trimmed(query.search);
        let matched_by_permission = match &search {
            Some(term) => daos.permission().role_ids_matching(term).await?,
            None => Vec::new(),
        };

        let page = daos
            .role()
            .list(query.page, query.limit, search, matched_by_permission)
            .await?;
        let role_ids = page.data.iter().map(|role| role.id).collect();
        let mut by_role: HashMap<Uuid, Vec<permission::Model>> = HashMap::new();
        for perm in daos.permission().find_by_roles(role_ids).await? {
            by_role.entry(perm.role_id).or_default().push(perm);
        }

        Ok(page.map(|role| RoleWithPermissions {
            permissions: by_role.remove(&role.id).unwrap_or_default(),
            role,
        }))
    }

    /// Both ids are checked before the transaction; inside it the user's
    /// previous assignment is replaced.
    pub async fn assign(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<role_assignment::Model, AppError> {
        let daos = self.services.daos();
        daos.user()
            .find_live(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        daos.role().find_optional(role_id).await?.ok_or_else(role_not_found)?;

        let txn = self.services.begin().await?;
        let assignment = daos.assignment().replace_on(&txn, user_id, role_id).await?;
        commit(txn).await?;
        tracing::info!(%user_id, %role_id, "role assigned");

        Ok(assignment)
    }

    pub async fn list_assignments(
        &self,
        query: AssignmentQuery,
    ) -> Result<PaginatedResponse<AssignmentView>, AppError> {
        let daos = self.services.daos();
        let page = daos
            .assignment()
            .list(query.page, query.limit, query.user_id, query.role_id)
            .await?;

        let user_ids = page.data.iter().map(|a| a.user_id).collect();
        let role_ids = page.data.iter().map(|a| a.role_id).collect();
        let users: HashMap<Uuid, user::Model> = daos
            .user()
            .find_many(user_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();
        let roles: HashMap<Uuid, role::Model> = daos
            .role()
            .find_many(role_ids)
            .await?
            .into_iter()
            .map(|role| (role.id, role))
            .collect();

        Ok(page.map(|assignment| AssignmentView {
            user: users.get(&assignment.user_id).map(|user| AssignedUser {
                name: user.name.clone(),
                email: user.email.clone(),
            }),
            role: roles.get(&assignment.role_id).map(|role| AssignedRole {
                name: role.name.clone(),
                is_manage_all: role.is_manage_all,
            }),
            assignment,
        }))
    }
}
