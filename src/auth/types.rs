use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: usize,
}

/// A `(subject, action)` pair a handler declares through its extractor type.
pub trait PermissionRequirement {
    const SUBJECT: &'static str;
    const ACTION: &'static str;
}

macro_rules! requirement {
    ($name:ident, $subject:literal, $action:literal) => {
        pub struct $name;

        impl PermissionRequirement for $name {
            const SUBJECT: &'static str = $subject;
            const ACTION: &'static str = $action;
        }
    };
}

requirement!(UserCreate, "User", "create");
requirement!(UserUpdate, "User", "update");
requirement!(UserList, "User", "list");
requirement!(UserShow, "User", "show");
requirement!(UserDelete, "User", "delete");

requirement!(RoleCreate, "Role", "create");
requirement!(RoleList, "Role", "list");
requirement!(RoleShow, "Role", "show");
requirement!(RoleUpdate, "Role", "update");
requirement!(RoleDelete, "Role", "delete");
requirement!(RoleAssign, "Role", "assign");
