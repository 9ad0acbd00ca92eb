use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;
use uuid::Uuid;

use super::context::{ServiceContext, commit};
use crate::{
    auth::{
        authorization::PermissionPair,
        oauth::NormalizedIdentity,
        password::hash_password,
        refresh,
    },
    db::dao::{
        DaoBase, DaoLayerError, PaginatedResponse, UserDao, UserListFilter,
        base::check_pagination,
    },
    db::entities::{role, user},
    error::AppError,
    validation::normalize_email,
};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub image: Option<String>,
    pub status: bool,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<String>,
    pub status: Option<bool>,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role_id: Option<Uuid>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub status: bool,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<&user::Model> for UserView {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RoleSummary {
    pub role_id: Option<Uuid>,
    pub name: Option<String>,
    pub is_manage_all: Option<bool>,
}

impl From<Option<&role::Model>> for RoleSummary {
    fn from(role: Option<&role::Model>) -> Self {
        match role {
            Some(role) => Self {
                role_id: Some(role.id),
                name: Some(role.name.clone()),
                is_manage_all: Some(role.is_manage_all),
            },
            None => Self::default(),
        }
    }
}

/// A user with the role they hold and that role's permission pairs.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    pub user: UserView,
    pub role: RoleSummary,
    pub permissions: Vec<PermissionPair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserView,
    pub role: RoleSummary,
}

#[derive(Clone)]
pub struct UserService {
    services: ServiceContext,
}

fn email_conflict(err: DaoLayerError) -> AppError {
    match err {
        DaoLayerError::Duplicate { .. } => AppError::conflict("Email already exists"),
        other => other.into(),
    }
}

fn user_not_found() -> AppError {
    AppError::not_found("User not found")
}

/// Stand-in address for provider accounts that expose no email.
fn placeholder_email(identity: &NormalizedIdentity) -> String {
    format!(
        "{}+{}@oauth.invalid",
        identity.provider.as_str(),
        identity.provider_id.to_lowercase()
    )
}

impl UserService {
    pub fn new(services: ServiceContext) -> Self {
        Self { services }
    }

    fn dao(&self) -> UserDao {
        self.services.daos().user()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.dao().find_by_email(&normalize_email(email)).await?)
    }

    pub async fn find_live(&self, id: Uuid) -> Result<user::Model, AppError> {
        self.dao().find_live(id).await?.ok_or_else(user_not_found)
    }

    pub async fn find_by_provider_identity(
        &self,
        identity: &NormalizedIdentity,
    ) -> Result<Option<user::Model>, AppError> {
        Ok(self
            .dao()
            .find_by_provider_identity(identity.provider.as_str(), &identity.provider_id)
            .await?)
    }

    async fn ensure_role(&self, role_id: Uuid) -> Result<(), AppError> {
        match self.services.daos().role().find_optional(role_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Role not found")),
        }
    }

    /// Inserts the user and, when given, the role assignment in one
    /// transaction. The welcome mail is queued after commit.
    pub async fn create_local(
        &self,
        input: NewUser,
        acting: Option<Uuid>,
    ) -> Result<UserDetails, AppError> {
        if let Some(role_id) = input.role_id {
            self.ensure_role(role_id).await?;
        }
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let model = user::ActiveModel {
            name: Set(input.name.trim().to_string()),
            email: Set(normalize_email(&input.email)),
            password_hash: Set(password_hash),
            email_verified_at: Set(Some(Utc::now().fixed_offset())),
            status: Set(input.status),
            image: Set(input.image),
            created_by: Set(acting),
            ..Default::default()
        };

        let daos = self.services.daos();
        let txn = self.services.begin().await?;
        let user = daos
            .user()
            .create_on(&txn, model)
            .await
            .map_err(email_conflict)?;
        if let Some(role_id) = input.role_id {
            daos.assignment().replace_on(&txn, user.id, role_id).await?;
        }
        commit(txn).await?;
        tracing::info!(user_id = %user.id, role_id = ?input.role_id, "user created");

        self.services.mail().welcome(&user).await;
        self.details_for(user).await
    }

    pub async fn create_from_oauth(
        &self,
        identity: &NormalizedIdentity,
    ) -> Result<user::Model, AppError> {
        let email = identity
            .email
            .as_deref()
            .map(normalize_email)
            .unwrap_or_else(|| placeholder_email(identity));
        let name = identity
            .name
            .clone()
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        let model = user::ActiveModel {
            name: Set(name),
            email: Set(email),
            password_hash: Set(None),
            email_verified_at: Set(Some(Utc::now().fixed_offset())),
            status: Set(true),
            image: Set(identity.avatar_url.clone()),
            provider: Set(Some(identity.provider.as_str().to_string())),
            provider_id: Set(Some(identity.provider_id.clone())),
            ..Default::default()
        };
        let user = self.dao().create(model).await.map_err(email_conflict)?;
        tracing::info!(user_id = %user.id, provider = identity.provider.as_str(), "user created from oauth profile");
        Ok(user)
    }

    pub async fn link_identity(
        &self,
        user_id: Uuid,
        identity: &NormalizedIdentity,
    ) -> Result<user::Model, AppError> {
        let user = self
            .dao()
            .link_identity(
                user_id,
                identity.provider.as_str().to_string(),
                identity.provider_id.clone(),
                identity.avatar_url.clone(),
            )
            .await?;
        tracing::info!(user_id = %user.id, provider = identity.provider.as_str(), "oauth identity linked");
        Ok(user)
    }

    /// Also drops the stored refresh token so existing sessions cannot renew.
    pub async fn update_password_on<C>(
        &self,
        conn: &C,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        let dao = self.dao();
        let user = dao
            .find_by_email_on(conn, &normalize_email(email))
            .await?
            .ok_or_else(user_not_found)?;
        let hash = hash_password(password)?;
        let updated = dao
            .update_on(conn, user.id, move |active| {
                active.password_hash = Set(Some(hash));
                active.refresh_token_hash = Set(None);
                active.refresh_expires_at = Set(None);
            })
            .await?;
        tracing::info!(user_id = %updated.id, "password updated");
        Ok(updated)
    }

    pub async fn set_refresh_token(
        &self,
        user_id: Uuid,
        hash: String,
        expires_at: DateTime<FixedOffset>,
    ) -> Result<(), AppError> {
        Ok(self
            .dao()
            .set_refresh_token(user_id, Some((hash, expires_at)))
            .await?)
    }

    pub async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        Ok(self.dao().set_refresh_token(user_id, None).await?)
    }

    /// False for unknown or deleted users, expired tokens, and hash mismatches.
    pub async fn verify_refresh_token(&self, user_id: Uuid, token: &str) -> Result<bool, AppError> {
        let Some(user) = self.dao().find_live(user_id).await? else {
            return Ok(false);
        };
        let expired = user
            .refresh_expires_at
            .is_none_or(|expires_at| expires_at <= Utc::now().fixed_offset());
        if expired {
            return Ok(false);
        }
        refresh::matches(token, user.refresh_token_hash.as_deref())
    }

    pub async fn record_login(&self, user_id: Uuid) -> Result<(), AppError> {
        Ok(self
            .dao()
            .set_last_login(user_id, Utc::now().fixed_offset())
            .await?)
    }

    pub async fn details(&self, user_id: Uuid) -> Result<UserDetails, AppError> {
        let user = self.find_live(user_id).await?;
        self.details_for(user).await
    }

    pub async fn details_for(&self, user: user::Model) -> Result<UserDetails, AppError> {
        let daos = self.services.daos();
        let role = match daos.assignment().find_by_user(user.id).await? {
            Some(assignment) => daos.role().find_optional(assignment.role_id).await?,
            None => None,
        };
        let permissions = match &role {
            Some(role) => daos
                .permission()
                .find_by_role(role.id)
                .await?
                .into_iter()
                .map(|perm| PermissionPair::new(perm.subject, perm.action))
                .collect(),
            None => Vec::new(),
        };

        Ok(UserDetails {
            user: UserView::from(&user),
            role: RoleSummary::from(role.as_ref()),
            permissions,
        })
    }

    /// Newest first. `search` also matches users through their role's name.
    pub async fn list(&self, query: UserQuery) -> Result<PaginatedResponse<UserListItem>, AppError> {
        check_pagination(query.page, query.limit, UserDao::MAX_PAGE_SIZE)?;
        let daos = self.services.daos();
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);

        let matching_user_ids = match &search {
            Some(term) => {
                let role_ids = daos.role().ids_matching_name(term).await?;
                daos.assignment().user_ids_for_roles(role_ids).await?
            }
            None => Vec::new(),
        };
        let restrict_to_ids = match query.role_id {
            Some(role_id) => {
                let ids = daos.assignment().user_ids_for_roles(vec![role_id]).await?;
                if ids.is_empty() {
                    return Ok(PaginatedResponse::empty(query.page, query.limit));
                }
                Some(ids)
            }
            None => None,
        };

        let page = self
            .dao()
            .list(
                query.page,
                query.limit,
                UserListFilter {
                    search,
                    matching_user_ids,
                    restrict_to_ids,
                },
            )
            .await?;

        let user_ids = page.data.iter().map(|user| user.id).collect();
        let assignments = daos.assignment().find_by_users(user_ids).await?;
        let role_ids = assignments.iter().map(|a| a.role_id).collect();
        let roles: HashMap<Uuid, role::Model> = daos
            .role()
            .find_many(role_ids)
            .await?
            .into_iter()
            .map(|role| (role.id, role))
            .collect();
        let role_of: HashMap<Uuid, Uuid> = assignments
            .into_iter()
            .map(|a| (a.user_id, a.role_id))
            .collect();

        Ok(page.map(|user| UserListItem {
            role: RoleSummary::from(role_of.get(&user.id).and_then(|id| roles.get(id))),
            user: UserView::from(&user),
        }))
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
        acting: Option<Uuid>,
    ) -> Result<UserDetails, AppError> {
        let existing = self.find_live(id).await?;
        let role_id = changes.role_id;
        if let Some(role_id) = role_id {
            self.ensure_role(role_id).await?;
        }
        let password_hash = changes.password.as_deref().map(hash_password).transpose()?;
        let email = changes.email.as_deref().map(normalize_email);
        // A new password or a disabled account ends every open session.
        let revoke_sessions = password_hash.is_some() || changes.status == Some(false);

        let daos = self.services.daos();
        let txn = self.services.begin().await?;
        let user = daos
            .user()
            .update_on(&txn, existing.id, move |active| {
                if let Some(name) = changes.name {
                    active.name = Set(name.trim().to_string());
                }
                if let Some(email) = email {
                    active.email = Set(email);
                }
                if let Some(hash) = password_hash {
                    active.password_hash = Set(Some(hash));
                }
                if let Some(image) = changes.image {
                    active.image = Set(Some(image));
                }
                if let Some(status) = changes.status {
                    active.status = Set(status);
                }
                if revoke_sessions {
                    active.refresh_token_hash = Set(None);
                    active.refresh_expires_at = Set(None);
                }
                active.updated_by = Set(acting);
            })
            .await
            .map_err(email_conflict)?;
        if let Some(role_id) = role_id {
            daos.assignment().replace_on(&txn, user.id, role_id).await?;
        }
        commit(txn).await?;
        tracing::info!(user_id = %user.id, role_id = ?role_id, revoke_sessions, "user updated");

        self.details_for(user).await
    }

    /// Soft-deletes the user and removes their assignment and reset tokens in
    /// the same transaction.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let user = self.find_live(id).await?;
        let daos = self.services.daos();
        let txn = self.services.begin().await?;
        daos.assignment().delete_by_user_on(&txn, user.id).await?;
        daos.password_reset()
            .delete_for_on(&txn, user.id, &user.email)
            .await?;
        daos.user().soft_delete_on(&txn, user.id).await?;
        commit(txn).await?;
        tracing::info!(user_id = %user.id, "user deleted");
        Ok(())
    }
}
