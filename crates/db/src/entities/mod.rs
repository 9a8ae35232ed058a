//! `SeaORM` entity definitions.

pub mod prelude;

pub mod card_limit_rules;
pub mod card_usage_buckets;
pub mod cards;
pub mod fuel_transactions;
pub mod org_accounts;
pub mod org_ledger_entries;
pub mod organizations;
pub mod sea_orm_active_enums;
pub mod stations;
pub mod webhook_events;
