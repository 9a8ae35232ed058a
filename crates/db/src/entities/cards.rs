//! `SeaORM` Entity for cards table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CardStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub card_number_hash: String,
    pub last4: String,
    pub status: CardStatus,
    pub vehicle_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_delete = "Cascade"
    )]
    Organizations,
    #[sea_orm(has_many = "super::card_limit_rules::Entity")]
    CardLimitRules,
    #[sea_orm(has_many = "super::card_usage_buckets::Entity")]
    CardUsageBuckets,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::card_limit_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardLimitRules.def()
    }
}

impl Related<super::card_usage_buckets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardUsageBuckets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
