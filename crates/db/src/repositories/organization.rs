//! Organization repository.

use chrono::Utc;
use fuelgate_shared::types::{CurrencyCode, Money, OrganizationId};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    org_accounts, org_ledger_entries, organizations,
    sea_orm_active_enums::{LedgerEntryType, OrganizationStatus},
};

/// Error types for organization operations.
#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    /// Opening balance cannot be negative.
    #[error("Opening balance cannot be negative: {0}")]
    NegativeOpeningBalance(Money),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an organization with its prepaid account.
#[derive(Debug, Clone)]
pub struct CreateOrganizationInput {
    /// Display name.
    pub name: String,
    /// Currency every card of the organization transacts in.
    pub currency: CurrencyCode,
    /// Initial balance, recorded as a CREDIT ledger entry when positive.
    pub opening_balance: Money,
}

/// Organization with its account.
#[derive(Debug, Clone)]
pub struct OrganizationWithAccount {
    /// Organization record.
    pub organization: organizations::Model,
    /// Account record.
    pub account: org_accounts::Model,
}

/// Organization repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an organization and its account atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the opening balance is negative or a write fails.
    pub async fn create_with_account(
        &self,
        input: CreateOrganizationInput,
    ) -> Result<OrganizationWithAccount, OrganizationError> {
        if input.opening_balance.is_negative() {
            return Err(OrganizationError::NegativeOpeningBalance(input.opening_balance));
        }

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let organization = organizations::ActiveModel {
            id: Set(OrganizationId::new().into_inner()),
            name: Set(input.name),
            status: Set(OrganizationStatus::Active),
            currency: Set(input.currency.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let account = org_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization.id),
            available_cents: Set(input.opening_balance.minor()),
            version: Set(0),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if input.opening_balance.is_positive() {
            org_ledger_entries::ActiveModel {
                id: Set(Uuid::now_v7()),
                account_id: Set(account.id),
                tx_id: Set(None),
                entry_type: Set(LedgerEntryType::Credit),
                amount_cents: Set(input.opening_balance.minor()),
                balance_after: Set(input.opening_balance.minor()),
                meta: Set(serde_json::json!({ "reason": "opening_balance" })),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization.id,
            currency = %organization.currency,
            opening_balance = %input.opening_balance,
            "Organization created"
        );

        Ok(OrganizationWithAccount {
            organization,
            account,
        })
    }

    /// Finds an organization by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: OrganizationId,
    ) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id.into_inner()).one(conn).await
    }
}
