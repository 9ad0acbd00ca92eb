use std::fmt;

use sea_orm::{DbErr, EntityTrait, SqlErr};
use uuid::Uuid;

#[derive(Debug)]
pub enum DaoLayerError {
    Db(DbErr),
    NotFound { entity: &'static str, id: Uuid },
    Duplicate { entity: &'static str },
    InvalidPagination { page: u64, page_size: u64 },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl DaoLayerError {
    /// Unique-index violations become `Duplicate`; everything else stays a raw
    /// database error.
    pub fn from_db<E: EntityTrait>(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DaoLayerError::Duplicate {
                entity: std::any::type_name::<E>(),
            },
            _ => DaoLayerError::Db(err),
        }
    }

    pub fn not_found<E: EntityTrait>(id: Uuid) -> Self {
        DaoLayerError::NotFound {
            entity: std::any::type_name::<E>(),
            id,
        }
    }
}

/// `rbac_server::db::entities::role::Entity` -> `role`
pub fn entity_label(type_name: &str) -> &str {
    let trimmed = type_name.strip_suffix("::Entity").unwrap_or(type_name);
    trimmed.rsplit("::").next().unwrap_or(trimmed)
}

impl fmt::Display for DaoLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoLayerError::Db(err) => write!(f, "Database error: {err}"),
            DaoLayerError::NotFound { entity, id } => {
                write!(f, "{} not found (id={id})", entity_label(entity))
            }
            DaoLayerError::Duplicate { entity } => {
                write!(f, "{} already exists", entity_label(entity))
            }
            DaoLayerError::InvalidPagination { page, page_size } => write!(
                f,
                "Invalid pagination: page={page} page_size={page_size}"
            ),
        }
    }
}

impl std::error::Error for DaoLayerError {}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::{DaoLayerError, entity_label};
    use crate::db::entities::role;

    #[test]
    fn entity_label_strips_module_path() {
        assert_eq!(entity_label("a::b::role_assignment::Entity"), "role_assignment");
        assert_eq!(entity_label("plain"), "plain");
    }

    #[test]
    fn non_constraint_errors_stay_raw() {
        let err = DaoLayerError::from_db::<role::Entity>(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
