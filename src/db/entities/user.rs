use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

/// Account row. `email` is stored lowercased; `password_hash` is `None` for
/// accounts that only ever signed in through an OAuth provider.
#[base_entity(soft_delete)]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub email_verified_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(default_value = true)]
    pub status: bool,
    pub image: Option<String>,
    #[sea_orm(unique_key = "provider_identity")]
    pub provider: Option<String>,
    #[sea_orm(unique_key = "provider_identity")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token_hash: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_expires_at: Option<DateTimeWithTimeZone>,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[sea_orm(has_one)]
    pub assignment: HasOne<super::role_assignment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
