#[allow(unused_imports)]
pub mod prelude {
    pub use super::password_reset_token::Entity as PasswordResetToken;
    pub use super::permission::Entity as Permission;
    pub use super::role::Entity as Role;
    pub use super::role_assignment::Entity as RoleAssignment;
    pub use super::user::Entity as User;
}

pub mod password_reset_token;
pub mod permission;
pub mod role;
pub mod role_assignment;
pub mod user;
