use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::authorization::{AuthzError, GrantSource, PermissionPair, RoleGrant, authorize},
    db::dao::{DaoContext, DaoLayerError},
    db::entities::user,
    error::AppError,
};

fn storage(err: DaoLayerError) -> AuthzError {
    AuthzError::Storage(err.to_string())
}

/// Loads grants from the role graph and answers permission checks for the
/// request gate.
#[derive(Clone)]
pub struct AccessService {
    daos: DaoContext,
}

impl AccessService {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    /// `user` is the live, active account the gate resolved from the bearer
    /// token. Every way of failing collapses into one generic `Forbidden`.
    pub async fn check(
        &self,
        user: &user::Model,
        subject: &str,
        action: &str,
    ) -> Result<(), AppError> {
        let user_id = user.id;
        match authorize(self, user_id, subject, action).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(%user_id, subject, action, "permission denied");
                Err(denied())
            }
            Err(AuthzError::Storage(err)) => {
                tracing::error!(%user_id, subject, action, error = %err, "authorization lookup failed");
                Err(denied())
            }
            Err(err) => {
                tracing::debug!(%user_id, subject, action, reason = %err, "permission denied");
                Err(denied())
            }
        }
    }
}

fn denied() -> AppError {
    AppError::forbidden("You do not have the required permission")
}

#[async_trait]
impl GrantSource for AccessService {
    async fn grant_for(&self, user_id: Uuid) -> Result<Option<RoleGrant>, AuthzError> {
        let Some(assignment) = self
            .daos
            .assignment()
            .find_by_user(user_id)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };
        let Some(role) = self
            .daos
            .role()
            .find_optional(assignment.role_id)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };

        if role.is_manage_all {
            return Ok(Some(RoleGrant {
                role_id: role.id,
                manage_all: true,
                permissions: None,
            }));
        }

        let permissions = self
            .daos
            .permission()
            .find_by_role(role.id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(|perm| PermissionPair::new(perm.subject, perm.action))
            .collect();

        Ok(Some(RoleGrant {
            role_id: role.id,
            manage_all: false,
            permissions: Some(permissions),
        }))
    }
}
