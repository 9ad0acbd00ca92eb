use sea_orm::DatabaseConnection;

use super::{AssignmentDao, DaoBase, PasswordResetDao, PermissionDao, RoleDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn role(&self) -> RoleDao {
        DaoBase::new(&self.db)
    }

    pub fn permission(&self) -> PermissionDao {
        DaoBase::new(&self.db)
    }

    pub fn assignment(&self) -> AssignmentDao {
        DaoBase::new(&self.db)
    }

    pub fn password_reset(&self) -> PasswordResetDao {
        DaoBase::new(&self.db)
    }
}
