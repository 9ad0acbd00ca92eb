use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(default_value = false)]
    pub is_manage_all: bool,
    pub guard_name: Option<String>,
    #[sea_orm(has_many)]
    pub permissions: HasMany<super::permission::Entity>,
    #[sea_orm(has_many)]
    pub assignments: HasMany<super::role_assignment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
