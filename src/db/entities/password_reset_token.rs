use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    // Weak reference; no foreign key so a token can outlive a purged user row.
    #[sea_orm(indexed)]
    pub user_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(indexed)]
    pub token: String,
    pub mode: String,
    pub expires_at: DateTimeWithTimeZone,
    pub redirect_url: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
