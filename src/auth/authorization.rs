//! Permission decisions.
//!
//! [`evaluate`] is the whole rule set and touches no storage. [`authorize`]
//! loads a user's grant through a [`GrantSource`] and hands it to `evaluate`.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionPair {
    pub subject: String,
    pub action: String,
}

impl PermissionPair {
    pub fn new(subject: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
        }
    }
}

/// What a user's single assigned role allows. `permissions` is `None` when the
/// set could not be loaded at all, which is not the same as an empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role_id: Uuid,
    pub manage_all: bool,
    pub permissions: Option<Vec<PermissionPair>>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("role not found")]
    RoleNotFound,
    #[error("user permissions not found")]
    PermissionsNotFound,
    #[error("authorization lookup failed: {0}")]
    Storage(String),
}

pub fn evaluate(grant: Option<&RoleGrant>, subject: &str, action: &str) -> Result<bool, AuthzError> {
    let grant = grant.ok_or(AuthzError::RoleNotFound)?;
    if grant.manage_all {
        return Ok(true);
    }
    let permissions = grant
        .permissions
        .as_ref()
        .ok_or(AuthzError::PermissionsNotFound)?;

    Ok(permissions
        .iter()
        .any(|perm| perm.subject == subject && perm.action == action))
}

#[async_trait]
pub trait GrantSource: Send + Sync {
    /// `Ok(None)` means the user has no assignment or the assigned role is gone.
    async fn grant_for(&self, user_id: Uuid) -> Result<Option<RoleGrant>, AuthzError>;
}

pub async fn authorize<G>(
    source: &G,
    user_id: Uuid,
    subject: &str,
    action: &str,
) -> Result<bool, AuthzError>
where
    G: GrantSource + ?Sized,
{
    let grant = source.grant_for(user_id).await?;
    evaluate(grant.as_ref(), subject, action)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::{AuthzError, GrantSource, PermissionPair, RoleGrant, authorize, evaluate};

    fn editor() -> RoleGrant {
        RoleGrant {
            role_id: Uuid::new_v4(),
            manage_all: false,
            permissions: Some(vec![
                PermissionPair::new("Post", "create"),
                PermissionPair::new("Post", "update"),
            ]),
        }
    }

    #[test]
    fn manage_all_allows_everything_even_with_empty_set() {
        let grant = RoleGrant {
            role_id: Uuid::new_v4(),
            manage_all: true,
            permissions: Some(Vec::new()),
        };
        for (subject, action) in [("Role", "delete"), ("User", "create"), ("Anything", "x")] {
            assert!(evaluate(Some(&grant), subject, action).expect("decision"));
        }

        let unloaded = RoleGrant {
            permissions: None,
            ..grant
        };
        assert!(evaluate(Some(&unloaded), "Role", "delete").expect("decision"));
    }

    #[test]
    fn exact_pair_is_allowed_and_near_misses_are_denied() {
        let grant = editor();
        assert!(evaluate(Some(&grant), "Post", "create").expect("decision"));
        assert!(evaluate(Some(&grant), "Post", "update").expect("decision"));
        assert!(!evaluate(Some(&grant), "Post", "delete").expect("decision"));
        assert!(!evaluate(Some(&grant), "post", "create").expect("decision"));
        assert!(!evaluate(Some(&grant), "Comment", "create").expect("decision"));
    }

    #[test]
    fn empty_set_denies() {
        let grant = RoleGrant {
            permissions: Some(Vec::new()),
            ..editor()
        };
        assert!(!evaluate(Some(&grant), "Post", "create").expect("decision"));
    }

    #[test]
    fn missing_role_and_missing_set_are_errors() {
        assert!(matches!(
            evaluate(None, "Post", "create"),
            Err(AuthzError::RoleNotFound)
        ));

        let grant = RoleGrant {
            permissions: None,
            ..editor()
        };
        assert!(matches!(
            evaluate(Some(&grant), "Post", "create"),
            Err(AuthzError::PermissionsNotFound)
        ));
    }

    struct FixedGrants(HashMap<Uuid, RoleGrant>);

    #[async_trait]
    impl GrantSource for FixedGrants {
        async fn grant_for(&self, user_id: Uuid) -> Result<Option<RoleGrant>, AuthzError> {
            Ok(self.0.get(&user_id).cloned())
        }
    }

    #[tokio::test]
    async fn authorize_loads_grant_for_the_user() {
        let user = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let source = FixedGrants(HashMap::from([(user, editor())]));

        assert!(authorize(&source, user, "Post", "create").await.expect("decision"));
        assert!(!authorize(&source, user, "Post", "delete").await.expect("decision"));
        assert!(matches!(
            authorize(&source, stranger, "Post", "create").await,
            Err(AuthzError::RoleNotFound)
        ));
    }
}
