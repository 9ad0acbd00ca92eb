pub mod assignment_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod password_reset_dao;
pub mod permission_dao;
pub mod role_dao;
pub mod user_dao;

pub use assignment_dao::AssignmentDao;
pub use base::{DaoBase, PaginatedResponse};
pub use base_traits::{
    HasCreatedAtColumn, HasDeletedAtColumn, HasIdActiveModel, SoftDeleteActiveModel,
    TimestampedActiveModel,
};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use password_reset_dao::PasswordResetDao;
pub use permission_dao::{NewPermission, PermissionDao};
pub use role_dao::RoleDao;
pub use user_dao::{UserDao, UserListFilter};
