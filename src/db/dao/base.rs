use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, Order, PrimaryKeyTrait, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use super::base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};

#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
        }
    }

    pub fn empty(page: u64, page_size: u64) -> Self {
        Self {
            data: Vec::new(),
            page,
            page_size,
            has_next: false,
        }
    }
}

pub fn check_pagination(page: u64, page_size: u64, max_page_size: u64) -> DaoResult<()> {
    if page == 0 || page_size == 0 || page_size > max_page_size {
        return Err(DaoLayerError::InvalidPagination { page, page_size });
    }
    Ok(())
}

/// `%term%` for a case-insensitive LIKE, with `%`, `_` and backslash escaped.
pub fn contains_pattern(term: &str) -> String {
    let term = term.trim().to_lowercase();
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// `LOWER(column) LIKE pattern ESCAPE '\\'`
pub fn lower_like<C: ColumnTrait>(column: C, pattern: &str) -> Condition {
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\')),
    )
}

/// Shared CRUD surface for every table. The `*_on` variants take any
/// connection so services can run them inside one transaction.
#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + HasIdActiveModel + TimestampedActiveModel + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    Self::Entity: HasCreatedAtColumn,
{
    type Entity: EntityTrait + Send + Sync;
    const MAX_PAGE_SIZE: u64 = 100;

    fn new(db: &DatabaseConnection) -> Self;

    fn db(&self) -> &DatabaseConnection;

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        self.create_on(self.db(), data).await
    }

    async fn create_on<C>(
        &self,
        conn: &C,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let now = Utc::now().fixed_offset();
        let mut active = data.into_active_model();
        active.set_id(Uuid::new_v4());
        active.set_created_at(now);
        active.set_updated_at(now);
        active
            .insert(conn)
            .await
            .map_err(DaoLayerError::from_db::<Self::Entity>)
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let model = Self::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        model.ok_or_else(|| DaoLayerError::not_found::<Self::Entity>(id))
    }

    async fn find(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>> {
        check_pagination(page, page_size, Self::MAX_PAGE_SIZE)?;

        let filtered = apply(Self::Entity::find());
        let ordered = match order {
            Some((column, order)) => filtered.order_by(column, order),
            None => filtered.order_by_desc(Self::Entity::created_at_column()),
        };
        let fetch_size = page_size.saturating_add(1);
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let mut data = ordered
            .limit(fetch_size)
            .offset(offset)
            .all(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        let has_next = data.len() > page_size as usize;
        if has_next {
            data.truncate(page_size as usize);
        }

        Ok(PaginatedResponse {
            data,
            page,
            page_size,
            has_next,
        })
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        self.update_on(self.db(), id, apply).await
    }

    async fn update_on<C, F>(
        &self,
        conn: &C,
        id: Uuid,
        apply: F,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: ConnectionTrait + Sync,
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = Self::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)?
            .ok_or_else(|| DaoLayerError::not_found::<Self::Entity>(id))?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());

        active
            .update(conn)
            .await
            .map_err(DaoLayerError::from_db::<Self::Entity>)
    }

    async fn delete_on<C>(&self, conn: &C, id: Uuid) -> DaoResult<Uuid>
    where
        C: ConnectionTrait + Sync,
    {
        let result = Self::Entity::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;

        if result.rows_affected == 0 {
            return Err(DaoLayerError::not_found::<Self::Entity>(id));
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{check_pagination, contains_pattern};
    use crate::db::dao::DaoLayerError;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" Post "), "%post%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn pagination_bounds_are_enforced() {
        assert!(check_pagination(1, 10, 100).is_ok());
        assert!(matches!(
            check_pagination(0, 10, 100),
            Err(DaoLayerError::InvalidPagination { page: 0, page_size: 10 })
        ));
        assert!(check_pagination(1, 101, 100).is_err());
    }
}
