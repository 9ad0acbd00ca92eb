use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{password_reset_token, prelude::PasswordResetToken};

#[derive(Clone)]
pub struct PasswordResetDao {
    db: DatabaseConnection,
}

impl DaoBase for PasswordResetDao {
    type Entity = PasswordResetToken;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PasswordResetDao {
    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> DaoResult<Option<password_reset_token::Model>> {
        PasswordResetToken::find()
            .filter(password_reset_token::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Removes every token tied to the user or to the email.
    pub async fn delete_for_on<C>(&self, conn: &C, user_id: Uuid, email: &str) -> DaoResult<u64>
    where
        C: ConnectionTrait,
    {
        PasswordResetToken::delete_many()
            .filter(
                Condition::any()
                    .add(password_reset_token::Column::UserId.eq(user_id))
                    .add(password_reset_token::Column::Email.eq(email)),
            )
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }

    pub async fn delete_by_email_on<C>(&self, conn: &C, email: &str) -> DaoResult<u64>
    where
        C: ConnectionTrait,
    {
        PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::Email.eq(email))
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }
}
