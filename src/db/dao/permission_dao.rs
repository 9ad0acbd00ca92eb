use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{contains_pattern, lower_like};
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{permission, prelude::Permission};

#[derive(Clone)]
pub struct PermissionDao {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    pub subject: String,
    pub action: String,
    pub description: Option<String>,
}

impl DaoBase for PermissionDao {
    type Entity = Permission;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PermissionDao {
    pub async fn find_by_role(&self, role_id: Uuid) -> DaoResult<Vec<permission::Model>> {
        self.find_by_role_on(&self.db, role_id).await
    }

    pub async fn find_by_role_on<C>(&self, conn: &C, role_id: Uuid) -> DaoResult<Vec<permission::Model>>
    where
        C: ConnectionTrait,
    {
        Permission::find()
            .filter(permission::Column::RoleId.eq(role_id))
            .order_by_asc(permission::Column::Subject)
            .order_by_asc(permission::Column::Action)
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_by_roles(&self, role_ids: Vec<Uuid>) -> DaoResult<Vec<permission::Model>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        Permission::find()
            .filter(permission::Column::RoleId.is_in(role_ids))
            .order_by_asc(permission::Column::Subject)
            .order_by_asc(permission::Column::Action)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn delete_by_role_on<C>(&self, conn: &C, role_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait,
    {
        Permission::delete_many()
            .filter(permission::Column::RoleId.eq(role_id))
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }

    pub async fn insert_for_role_on<C>(
        &self,
        conn: &C,
        role_id: Uuid,
        permissions: Vec<NewPermission>,
    ) -> DaoResult<Vec<permission::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        let mut inserted = Vec::with_capacity(permissions.len());
        for permission in permissions {
            let model = permission::ActiveModel {
                role_id: Set(role_id),
                subject: Set(permission.subject),
                action: Set(permission.action),
                description: Set(permission.description),
                ..Default::default()
            };
            inserted.push(self.create_on(conn, model).await?);
        }
        Ok(inserted)
    }

    /// Distinct ids of roles owning a permission whose subject or action
    /// contains `search`.
    pub async fn role_ids_matching(&self, search: &str) -> DaoResult<Vec<Uuid>> {
        let pattern = contains_pattern(search);
        Permission::find()
            .select_only()
            .column(permission::Column::RoleId)
            .distinct()
            .filter(
                Condition::any()
                    .add(lower_like(permission::Column::Subject, &pattern))
                    .add(lower_like(permission::Column::Action, &pattern)),
            )
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }
}
