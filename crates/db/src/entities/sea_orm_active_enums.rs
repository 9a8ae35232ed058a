//! Text-backed enums stored in the FuelGate schema.
//!
//! Each mirrors a `fuelgate_core` type; the conversions below keep the two in
//! lock step.

use fuelgate_core::card::CardStatus as CoreCardStatus;
use fuelgate_core::idempotency::WebhookEventStatus as CoreEventStatus;
use fuelgate_core::ledger::EntryType;
use fuelgate_core::limits::{PeriodType as CorePeriodType, WindowMode as CoreWindowMode};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organization status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrganizationStatus {
    /// Operating.
    #[sea_orm(string_value = "active")]
    Active,
    /// Suspended.
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

/// Card status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum CardStatus {
    /// May transact.
    #[sea_orm(string_value = "active")]
    Active,
    /// Every transaction is declined.
    #[sea_orm(string_value = "blocked")]
    Blocked,
}

/// Limit period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PeriodType {
    /// One day.
    #[sea_orm(string_value = "DAILY")]
    Daily,
    /// One week.
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    /// One month.
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
    /// Anchored or rolling.
    #[sea_orm(string_value = "CUSTOM")]
    Custom,
}

/// Limit window mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum WindowMode {
    /// Calendar aligned.
    #[sea_orm(string_value = "CALENDAR")]
    Calendar,
    /// Monthly anchor day.
    #[sea_orm(string_value = "ANCHOR")]
    Anchor,
    /// Trailing hours.
    #[sea_orm(string_value = "ROLLING")]
    Rolling,
}

/// Webhook event processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum WebhookEventStatus {
    /// Stored, undecided.
    #[sea_orm(string_value = "received")]
    Received,
    /// Approved; terminal.
    #[sea_orm(string_value = "processed")]
    Processed,
    /// Declined or errored; retryable.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Fuel transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum FuelTransactionStatus {
    /// Balance debited.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined; see decline reason.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Recorded but not decided.
    #[sea_orm(string_value = "pending")]
    Pending,
}

/// Ledger entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum LedgerEntryType {
    /// Balance decreased.
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    /// Balance increased.
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

impl From<CardStatus> for CoreCardStatus {
    fn from(status: CardStatus) -> Self {
        match status {
            CardStatus::Active => Self::Active,
            CardStatus::Blocked => Self::Blocked,
        }
    }
}

impl From<CoreCardStatus> for CardStatus {
    fn from(status: CoreCardStatus) -> Self {
        match status {
            CoreCardStatus::Active => Self::Active,
            CoreCardStatus::Blocked => Self::Blocked,
        }
    }
}

impl From<PeriodType> for CorePeriodType {
    fn from(period: PeriodType) -> Self {
        match period {
            PeriodType::Daily => Self::Daily,
            PeriodType::Weekly => Self::Weekly,
            PeriodType::Monthly => Self::Monthly,
            PeriodType::Custom => Self::Custom,
        }
    }
}

impl From<CorePeriodType> for PeriodType {
    fn from(period: CorePeriodType) -> Self {
        match period {
            CorePeriodType::Daily => Self::Daily,
            CorePeriodType::Weekly => Self::Weekly,
            CorePeriodType::Monthly => Self::Monthly,
            CorePeriodType::Custom => Self::Custom,
        }
    }
}

impl From<WindowMode> for CoreWindowMode {
    fn from(mode: WindowMode) -> Self {
        match mode {
            WindowMode::Calendar => Self::Calendar,
            WindowMode::Anchor => Self::Anchor,
            WindowMode::Rolling => Self::Rolling,
        }
    }
}

impl From<CoreWindowMode> for WindowMode {
    fn from(mode: CoreWindowMode) -> Self {
        match mode {
            CoreWindowMode::Calendar => Self::Calendar,
            CoreWindowMode::Anchor => Self::Anchor,
            CoreWindowMode::Rolling => Self::Rolling,
        }
    }
}

impl From<WebhookEventStatus> for CoreEventStatus {
    fn from(status: WebhookEventStatus) -> Self {
        match status {
            WebhookEventStatus::Received => Self::Received,
            WebhookEventStatus::Processed => Self::Processed,
            WebhookEventStatus::Failed => Self::Failed,
        }
    }
}

impl From<CoreEventStatus> for WebhookEventStatus {
    fn from(status: CoreEventStatus) -> Self {
        match status {
            CoreEventStatus::Received => Self::Received,
            CoreEventStatus::Processed => Self::Processed,
            CoreEventStatus::Failed => Self::Failed,
        }
    }
}

impl From<EntryType> for LedgerEntryType {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Debit => Self::Debit,
            EntryType::Credit => Self::Credit,
        }
    }
}
