pub mod authorization;
pub mod bootstrap;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod refresh;
mod types;

pub use types::{
    Claims, PermissionRequirement, RoleAssign, RoleCreate, RoleDelete, RoleList, RoleShow,
    RoleUpdate, TokenBundle, UserCreate, UserDelete, UserList, UserShow, UserUpdate,
};
