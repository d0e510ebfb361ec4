//! Database transaction utilities

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use vantage_core::AppError;

/// Transaction wrapper for multi-statement operations.
///
/// Dropping the guard without `commit` rolls the transaction back (sqlx issues
/// the rollback when the inner transaction is dropped); the guard logs it.
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
    operation: &'static str,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool, operation: &'static str) -> Result<Self, AppError> {
        let transaction = pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to begin database transaction");
            AppError::Database(e)
        })?;

        Ok(Self {
            transaction: Some(transaction),
            operation,
        })
    }

    /// Connection to run statements on
    pub fn executor(&mut self) -> Result<&mut PgConnection, AppError> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::Internal(format!("Transaction for {} already finished", self.operation))
        })
    }

    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await.map_err(|e| {
                tracing::error!(error = %e, operation = self.operation, "Failed to commit database transaction");
                AppError::Database(e)
            })?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            tracing::warn!(
                operation = self.operation,
                "Transaction dropped without commit - rolling back"
            );
        }
    }
}
