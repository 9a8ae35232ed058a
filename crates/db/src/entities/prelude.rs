//! Entity re-exports.

pub use super::card_limit_rules::Entity as CardLimitRules;
pub use super::card_usage_buckets::Entity as CardUsageBuckets;
pub use super::cards::Entity as Cards;
pub use super::fuel_transactions::Entity as FuelTransactions;
pub use super::org_accounts::Entity as OrgAccounts;
pub use super::org_ledger_entries::Entity as OrgLedgerEntries;
pub use super::organizations::Entity as Organizations;
pub use super::stations::Entity as Stations;
pub use super::webhook_events::Entity as WebhookEvents;
