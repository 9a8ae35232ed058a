//! `SeaORM` Entity for org_ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LedgerEntryType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "org_ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub tx_id: Option<Uuid>,
    pub entry_type: LedgerEntryType,
    pub amount_cents: i64,
    pub balance_after: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub meta: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::org_accounts::Entity",
        from = "Column::AccountId",
        to = "super::org_accounts::Column::Id",
        on_delete = "Cascade"
    )]
    OrgAccounts,
}

impl Related<super::org_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrgAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
