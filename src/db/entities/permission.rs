use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

/// A `(subject, action)` pair owned by exactly one role.
#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(unique_key = "role_permission")]
    pub role_id: Uuid,
    #[sea_orm(unique_key = "role_permission")]
    pub subject: String,
    #[sea_orm(unique_key = "role_permission")]
    pub action: String,
    pub description: Option<String>,
    #[sea_orm(belongs_to, from = "role_id", to = "id", on_delete = "Cascade")]
    pub role: HasOne<super::role::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
