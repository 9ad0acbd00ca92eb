use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::base::{contains_pattern, lower_like};
use super::base_traits::{HasDeletedAtColumn, SoftDeleteActiveModel};
use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

/// Filters for the admin user listing. `matching_user_ids` carries the users
/// found through their role name in a first pass.
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub search: Option<String>,
    pub matching_user_ids: Vec<Uuid>,
    pub restrict_to_ids: Option<Vec<Uuid>>,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn live() -> Condition {
    Condition::all().add(User::deleted_at_column().is_null())
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        self.find_by_email_on(&self.db, email).await
    }

    pub async fn find_by_email_on<C>(&self, conn: &C, email: &str) -> DaoResult<Option<user::Model>>
    where
        C: ConnectionTrait,
    {
        User::find()
            .filter(live())
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_live(&self, id: Uuid) -> DaoResult<Option<user::Model>> {
        User::find_by_id(id)
            .filter(live())
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_by_provider_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(live())
            .filter(user::Column::Provider.eq(provider))
            .filter(user::Column::ProviderId.eq(provider_id))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> DaoResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        User::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        filter: UserListFilter,
    ) -> DaoResult<PaginatedResponse<user::Model>> {
        self.find(page, page_size, None, move |query| {
            let mut query = query.filter(live());
            if let Some(ids) = filter.restrict_to_ids {
                query = query.filter(user::Column::Id.is_in(ids));
            }
            match filter.search.as_deref().map(str::trim) {
                Some(term) if !term.is_empty() => {
                    let pattern = contains_pattern(term);
                    let mut any = Condition::any()
                        .add(lower_like(user::Column::Name, &pattern))
                        .add(lower_like(user::Column::Email, &pattern));
                    if !filter.matching_user_ids.is_empty() {
                        any = any.add(user::Column::Id.is_in(filter.matching_user_ids));
                    }
                    query.filter(any)
                }
                _ => query,
            }
        })
        .await
    }

    /// Stores or clears the hash of the user's current refresh token.
    pub async fn set_refresh_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<FixedOffset>)>,
    ) -> DaoResult<()> {
        let (hash, expires_at) = token.unzip();
        self.update(id, move |active| {
            active.refresh_token_hash = Set(hash);
            active.refresh_expires_at = Set(expires_at);
        })
        .await
        .map(|_| ())
    }

    pub async fn set_last_login(&self, id: Uuid, at: DateTime<FixedOffset>) -> DaoResult<()> {
        self.update(id, move |active| {
            active.last_login_at = Set(Some(at));
        })
        .await
        .map(|_| ())
    }

    /// Overwrites the provider identity on an existing account. The avatar is
    /// only filled in when the account has none.
    pub async fn link_identity(
        &self,
        id: Uuid,
        provider: String,
        provider_id: String,
        avatar: Option<String>,
    ) -> DaoResult<user::Model> {
        let existing = self
            .find_live(id)
            .await?
            .ok_or_else(|| DaoLayerError::not_found::<User>(id))?;
        let keep_image = existing.image.is_some();
        self.update(id, move |active| {
            active.provider = Set(Some(provider));
            active.provider_id = Set(Some(provider_id));
            if !keep_image {
                active.image = Set(avatar);
            }
        })
        .await
    }

    pub async fn soft_delete_on<C>(&self, conn: &C, id: Uuid) -> DaoResult<()>
    where
        C: ConnectionTrait + Sync,
    {
        let now = Utc::now().fixed_offset();
        let found = User::find_by_id(id)
            .filter(live())
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        if found.is_none() {
            return Err(DaoLayerError::not_found::<User>(id));
        }

        self.update_on(conn, id, move |active| {
            active.set_deleted_at(Some(now));
            active.refresh_token_hash = Set(None);
            active.refresh_expires_at = Set(None);
        })
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{UserDao, UserListFilter};
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::user;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn user_model(id: Uuid, email: &str) -> user::Model {
        let now = ts();
        user::Model {
            id,
            created_at: now,
            updated_at: now,
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: Some("hash".to_string()),
            email_verified_at: Some(now),
            status: true,
            image: None,
            provider: None,
            provider_id: None,
            refresh_token_hash: None,
            refresh_expires_at: None,
            last_login_at: None,
            created_by: None,
            updated_by: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn find_by_email_returns_first_match() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model(id, "alice@x.com")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let found = dao
            .find_by_email("alice@x.com")
            .await
            .expect("query should succeed");
        assert_eq!(found.map(|u| u.id), Some(id));

        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("deleted_at"), "live filter missing: {sql}");
    }

    #[tokio::test]
    async fn list_truncates_and_flags_next_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                user_model(Uuid::new_v4(), "a@x.com"),
                user_model(Uuid::new_v4(), "b@x.com"),
                user_model(Uuid::new_v4(), "c@x.com"),
            ]])
            .into_connection();
        let dao = UserDao::new(&db);

        let page = dao
            .list(
                1,
                2,
                UserListFilter {
                    search: Some("x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("list should succeed");

        assert_eq!(page.data.len(), 2);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn soft_delete_missing_user_is_not_found() {
        let missing = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .soft_delete_on(&db, missing)
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::NotFound { id, .. } if id == missing));
    }

    #[tokio::test]
    async fn soft_delete_marks_row() {
        let id = Uuid::new_v4();
        let mut deleted = user_model(id, "alice@x.com");
        deleted.deleted_at = Some(ts());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [user_model(id, "alice@x.com")],
                [user_model(id, "alice@x.com")],
                [deleted],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let dao = UserDao::new(&db);

        dao.soft_delete_on(&db, id)
            .await
            .expect("soft delete should succeed");
    }
}
