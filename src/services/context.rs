use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{
    auth::jwt::JwtKeys,
    config::{AuthConfig, GeneralConfig},
    db::dao::{DaoContext, DaoLayerError},
    error::AppError,
    mail::Mailer,
    services::{
        access_service::AccessService, auth_service::AuthService, mail_service::MailService,
        password_reset_service::PasswordResetService, role_service::RoleService,
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    mailer: Mailer,
    general: GeneralConfig,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, mailer: Mailer, general: GeneralConfig) -> Self {
        Self {
            daos: DaoContext::new(db),
            mailer,
            general,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, state.mailer.clone(), state.config.general.clone())
    }

    pub fn daos(&self) -> &DaoContext {
        &self.daos
    }

    pub fn mail(&self) -> MailService {
        MailService::new(self.mailer.clone(), self.general.clone())
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.clone())
    }

    pub fn role(&self) -> RoleService {
        RoleService::new(self.clone())
    }

    pub fn access(&self) -> AccessService {
        AccessService::new(self.daos.clone())
    }

    pub fn password_reset(&self) -> PasswordResetService {
        PasswordResetService::new(self.clone())
    }

    pub fn auth<'a>(&self, keys: &'a JwtKeys, cfg: &'a AuthConfig) -> AuthService<'a> {
        AuthService::new(self.user(), keys, cfg)
    }

    pub(crate) async fn begin(&self) -> Result<DatabaseTransaction, AppError> {
        Ok(self.daos.db().begin().await.map_err(DaoLayerError::Db)?)
    }
}

pub(crate) async fn commit(txn: DatabaseTransaction) -> Result<(), AppError> {
    Ok(txn.commit().await.map_err(DaoLayerError::Db)?)
}
