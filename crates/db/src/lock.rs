//! Lock-bounded units of work.
//!
//! Every authorization runs inside one transaction whose row-lock waits are
//! capped with `SET LOCAL lock_timeout`, so a hot account or bucket surfaces
//! as a retryable `LOCK_TIMEOUT` instead of a hung request.
//!
//! # Usage
//!
//! ```ignore
//! use fuelgate_db::lock::LockScope;
//!
//! let scope = LockScope::begin(&db, 5_000).await?;
//! let account = ledger.lock(scope.transaction(), org_id).await?;
//! scope.commit().await?;
//! ```

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, RuntimeErr, TransactionTrait};

/// SQLSTATE `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// A transaction with a bounded lock wait.
pub struct LockScope {
    txn: DatabaseTransaction,
}

impl LockScope {
    /// Begins a transaction and sets its lock timeout.
    ///
    /// `SET LOCAL` scopes the setting to this transaction only; pooled
    /// connections are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the timeout
    /// cannot be set.
    pub async fn begin(db: &DatabaseConnection, lock_timeout_ms: u64) -> Result<Self, DbErr> {
        let txn = db.begin().await?;

        // Integer formatting only, no user input reaches this statement
        let sql = format!("SET LOCAL lock_timeout = '{lock_timeout_ms}ms'");
        txn.execute_unprepared(&sql).await?;

        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Returns true if the error is a lock wait that hit `lock_timeout`.
#[must_use]
pub fn is_lock_timeout(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Query(runtime) | DbErr::Exec(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
            db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE)
        }
        _ => false,
    }
}
