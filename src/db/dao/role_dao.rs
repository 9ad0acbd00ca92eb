use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::base::{contains_pattern, lower_like};
use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{prelude::Role, role};

#[derive(Clone)]
pub struct RoleDao {
    db: DatabaseConnection,
}

impl DaoBase for RoleDao {
    type Entity = Role;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RoleDao {
    pub async fn find_by_name(&self, name: &str) -> DaoResult<Option<role::Model>> {
        Role::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_optional(&self, id: Uuid) -> DaoResult<Option<role::Model>> {
        Role::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> DaoResult<Vec<role::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Role::find()
            .filter(role::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Roles whose name or guard matches `search`, plus any role listed in
    /// `matched_by_permission`. Sorted by name, ignoring case.
    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        search: Option<String>,
        matched_by_permission: Vec<Uuid>,
    ) -> DaoResult<PaginatedResponse<role::Model>> {
        self.find(page, page_size, None, move |query| {
            let query = query.order_by(
                Expr::expr(Func::lower(Expr::col(role::Column::Name))),
                Order::Asc,
            );
            match search.as_deref().map(str::trim) {
                Some(term) if !term.is_empty() => {
                    let pattern = contains_pattern(term);
                    let mut any = Condition::any()
                        .add(lower_like(role::Column::Name, &pattern))
                        .add(lower_like(role::Column::GuardName, &pattern));
                    if !matched_by_permission.is_empty() {
                        any = any.add(role::Column::Id.is_in(matched_by_permission));
                    }
                    query.filter(any)
                }
                _ => query,
            }
        })
        .await
    }

    pub async fn ids_matching_name(&self, search: &str) -> DaoResult<Vec<Uuid>> {
        Role::find()
            .select_only()
            .column(role::Column::Id)
            .filter(lower_like(role::Column::Name, &contains_pattern(search)))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use uuid::Uuid;

    use super::RoleDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::role;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn role_model(name: &str) -> role::Model {
        role::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            name: name.to_string(),
            is_manage_all: false,
            guard_name: None,
        }
    }

    #[tokio::test]
    async fn list_sorts_by_lowercased_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[role_model("Editor")]])
            .into_connection();
        let dao = RoleDao::new(&db);

        let page = dao
            .list(1, 10, Some("edit".to_string()), vec![Uuid::new_v4()])
            .await
            .expect("list should succeed");
        assert_eq!(page.data[0].name, "Editor");
        assert!(!page.has_next);

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains("LOWER"), "expected case-insensitive sort: {sql}");
    }

    #[tokio::test]
    async fn find_by_id_maps_missing_row_to_not_found() {
        let missing = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<role::Model>::new()])
            .into_connection();
        let dao = RoleDao::new(&db);

        let err = dao.find_by_id(missing).await.expect_err("role is missing");
        assert!(matches!(err, DaoLayerError::NotFound { id, .. } if id == missing));
    }

    #[tokio::test]
    async fn delete_propagates_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("delete failed".to_string())])
            .into_connection();
        let dao = RoleDao::new(&db);

        let err = dao
            .delete_on(&db, Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
