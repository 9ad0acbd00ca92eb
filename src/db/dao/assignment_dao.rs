use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{prelude::RoleAssignment, role_assignment};

#[derive(Clone)]
pub struct AssignmentDao {
    db: DatabaseConnection,
}

impl DaoBase for AssignmentDao {
    type Entity = RoleAssignment;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl AssignmentDao {
    pub async fn find_by_user(&self, user_id: Uuid) -> DaoResult<Option<role_assignment::Model>> {
        RoleAssignment::find()
            .filter(role_assignment::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_by_users(
        &self,
        user_ids: Vec<Uuid>,
    ) -> DaoResult<Vec<role_assignment::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        RoleAssignment::find()
            .filter(role_assignment::Column::UserId.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn user_ids_for_roles(&self, role_ids: Vec<Uuid>) -> DaoResult<Vec<Uuid>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        RoleAssignment::find()
            .select_only()
            .column(role_assignment::Column::UserId)
            .filter(role_assignment::Column::RoleId.is_in(role_ids))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        user_id: Option<Uuid>,
        role_id: Option<Uuid>,
    ) -> DaoResult<PaginatedResponse<role_assignment::Model>> {
        self.find(page, page_size, None, move |query| {
            let query = match user_id {
                Some(user_id) => query.filter(role_assignment::Column::UserId.eq(user_id)),
                None => query,
            };
            match role_id {
                Some(role_id) => query.filter(role_assignment::Column::RoleId.eq(role_id)),
                None => query,
            }
        })
        .await
    }

    pub async fn delete_by_user_on<C>(&self, conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait,
    {
        RoleAssignment::delete_many()
            .filter(role_assignment::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }

    pub async fn delete_by_role_on<C>(&self, conn: &C, role_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait,
    {
        RoleAssignment::delete_many()
            .filter(role_assignment::Column::RoleId.eq(role_id))
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }

    /// Replaces whatever assignment the user had. Callers own the transaction.
    pub async fn replace_on<C>(
        &self,
        conn: &C,
        user_id: Uuid,
        role_id: Uuid,
    ) -> DaoResult<role_assignment::Model>
    where
        C: ConnectionTrait + Sync,
    {
        self.delete_by_user_on(conn, user_id).await?;
        let model = role_assignment::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            ..Default::default()
        };
        self.create_on(conn, model).await
    }
}
