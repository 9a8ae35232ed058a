//! Balance ledger: organization accounts and their audit trail.
//!
//! The account balance is only ever changed here, under an exclusive row
//! lock, and every change appends an `org_ledger_entries` row carrying the
//! balance after the change.

use chrono::Utc;
use fuelgate_core::ledger::{BalanceChange, LedgerError, OrgAccount};
use fuelgate_shared::types::{
    FuelTransactionId, LedgerEntryId, Money, OrgAccountId, OrganizationId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};

use crate::entities::{org_accounts, org_ledger_entries};

/// Error types for balance operations.
#[derive(Debug, thiserror::Error)]
pub enum BalanceLedgerError {
    /// The organization has no account.
    #[error("Account not found for organization {0}")]
    AccountNotFound(OrganizationId),

    /// The balance rule rejected the change.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The stored version moved although the row was locked.
    #[error("Account {0} changed concurrently")]
    VersionConflict(OrgAccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Organization balance ledger.
#[derive(Debug, Clone)]
pub struct BalanceLedger {
    db: DatabaseConnection,
}

impl BalanceLedger {
    /// Creates a new balance ledger.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Locks the organization's account row (`SELECT ... FOR UPDATE`).
    ///
    /// Returns `None` if the organization has no account.
    pub async fn lock(
        &self,
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
    ) -> Result<Option<OrgAccount>, DbErr> {
        Ok(org_accounts::Entity::find()
            .filter(org_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .map(to_domain))
    }

    /// Debits a locked account and records the entry.
    ///
    /// The only path that lowers a balance; approvals call it with the row
    /// locked by [`Self::lock`] in the same transaction.
    ///
    /// # Errors
    ///
    /// `Ledger(InsufficientFunds)` leaves both the account and the database
    /// untouched.
    pub async fn debit(
        &self,
        txn: &DatabaseTransaction,
        account: &mut OrgAccount,
        amount: Money,
        transaction_id: FuelTransactionId,
    ) -> Result<BalanceChange, BalanceLedgerError> {
        let change = account.debit(amount)?;
        self.record(txn, account, &change, Some(transaction_id)).await?;
        Ok(change)
    }

    /// Persists a change already applied to the in-memory account and
    /// appends its ledger entry.
    ///
    /// The update is guarded by the pre-change version; a mismatch means the
    /// row was not actually locked by this transaction.
    async fn record(
        &self,
        txn: &DatabaseTransaction,
        account: &OrgAccount,
        change: &BalanceChange,
        transaction_id: Option<FuelTransactionId>,
    ) -> Result<(), BalanceLedgerError> {
        let updated = org_accounts::Entity::update_many()
            .col_expr(org_accounts::Column::AvailableCents, Expr::value(change.after.minor()))
            .col_expr(org_accounts::Column::Version, Expr::value(change.version))
            .filter(org_accounts::Column::Id.eq(account.id.into_inner()))
            .filter(org_accounts::Column::Version.eq(change.version - 1))
            .exec(txn)
            .await?;
        if updated.rows_affected != 1 {
            return Err(BalanceLedgerError::VersionConflict(account.id));
        }

        org_ledger_entries::ActiveModel {
            id: Set(LedgerEntryId::new().into_inner()),
            account_id: Set(account.id.into_inner()),
            tx_id: Set(transaction_id.map(FuelTransactionId::into_inner)),
            entry_type: Set(change.entry_type.into()),
            amount_cents: Set(change.amount.minor()),
            balance_after: Set(change.after.minor()),
            meta: Set(serde_json::json!({ "balance_before": change.before.minor() })),
            created_at: Set(Utc::now().into()),
        }
        .insert(txn)
        .await?;

        Ok(())
    }

    /// Tops up an organization's account in its own transaction.
    ///
    /// Takes the same account lock as authorizations, so a credit never
    /// interleaves with a debit.
    pub async fn credit(
        &self,
        organization_id: OrganizationId,
        amount: Money,
    ) -> Result<BalanceChange, BalanceLedgerError> {
        let txn = self.db.begin().await?;
        let mut account = self
            .lock(&txn, organization_id)
            .await?
            .ok_or(BalanceLedgerError::AccountNotFound(organization_id))?;

        let change = account.credit(amount)?;
        self.record(&txn, &account, &change, None).await?;
        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            amount = %amount,
            balance_after = %change.after,
            "Account credited"
        );
        Ok(change)
    }

    /// Reads an account without locking.
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        organization_id: OrganizationId,
    ) -> Result<Option<OrgAccount>, DbErr> {
        Ok(org_accounts::Entity::find()
            .filter(org_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(conn)
            .await?
            .map(to_domain))
    }

    /// Current available balance.
    pub async fn balance(&self, organization_id: OrganizationId) -> Result<Option<Money>, DbErr> {
        Ok(self
            .find(&self.db, organization_id)
            .await?
            .map(|account| account.available))
    }

    /// Ledger entries of an account, oldest first.
    pub async fn entries(
        &self,
        account_id: OrgAccountId,
    ) -> Result<Vec<org_ledger_entries::Model>, DbErr> {
        org_ledger_entries::Entity::find()
            .filter(org_ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(org_ledger_entries::Column::CreatedAt)
            .order_by_asc(org_ledger_entries::Column::Id)
            .all(&self.db)
            .await
    }
}

fn to_domain(model: org_accounts::Model) -> OrgAccount {
    OrgAccount {
        id: OrgAccountId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        available: Money::from_minor(model.available_cents),
        version: model.version,
    }
}
