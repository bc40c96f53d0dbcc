use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Loan, ResultEngine, Transaction, loans,
    reconcile::{derive_status, paid_amount},
    transactions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes a loan's paid amount and status from its linked
    /// transactions.
    ///
    /// Idempotent: running it twice over the same transactions gives the same
    /// loan. Fails with `KeyNotFound` for unknown ids and never creates a
    /// loan.
    pub async fn reconcile_loan(&self, loan_id: Uuid) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            self.reconcile_loan_in(&db_tx, loan_id).await
        })
    }

    /// Reconciles every loan. Returns how many loans changed.
    pub async fn reconcile_all_loans(&self) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let models = loans::Entity::find()
                .order_by_asc(loans::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let mut changed = 0u64;
            for model in models {
                let before = Loan::try_from(model)?;
                let after = self.reconcile_loan_in(&db_tx, before.id).await?;
                if before.paid_amount_minor != after.paid_amount_minor
                    || before.status != after.status
                {
                    tracing::warn!(
                        loan_id = %after.id,
                        stored_paid = before.paid_amount_minor,
                        paid = after.paid_amount_minor,
                        "loan had drifted from its transactions"
                    );
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    /// Reads the loan row under an exclusive lock and returns it.
    ///
    /// Row locking is emitted as `FOR UPDATE` on backends that support it;
    /// SQLite serializes writers at the database level instead.
    pub(super) async fn lock_loan(
        &self,
        db_tx: &DatabaseTransaction,
        loan_id: Uuid,
    ) -> ResultEngine<loans::Model> {
        loans::Entity::find_by_id(loan_id.to_string())
            .lock_exclusive()
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("loan not exists".to_string()))
    }

    /// Reconciliation inside the caller's DB transaction.
    ///
    /// Exactly one loan row update per call.
    pub(super) async fn reconcile_loan_in(
        &self,
        db_tx: &DatabaseTransaction,
        loan_id: Uuid,
    ) -> ResultEngine<Loan> {
        let model = self.lock_loan(db_tx, loan_id).await?;
        let linked = model
            .find_related(transactions::Entity)
            .all(db_tx)
            .await?;
        let loan = Loan::try_from(model)?;

        let mut links = Vec::with_capacity(linked.len());
        for tx_model in linked {
            let tx = Transaction::try_from(tx_model)?;
            if let Some(link) = tx.loan {
                links.push((link.role, tx.kind, tx.amount_minor));
            }
        }

        let paid = paid_amount(loan.kind, links)?;
        let status = derive_status(loan.status, paid, loan.total_amount_minor);

        let active = loans::ActiveModel {
            id: ActiveValue::Set(loan.id.to_string()),
            paid_amount_minor: ActiveValue::Set(paid),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        active.update(db_tx).await?;

        if status != loan.status {
            tracing::info!(
                loan_id = %loan.id,
                from = loan.status.as_str(),
                to = status.as_str(),
                "loan status changed"
            );
        }
        tracing::debug!(loan_id = %loan.id, paid, "loan reconciled");

        Ok(Loan {
            paid_amount_minor: paid,
            status,
            ..loan
        })
    }
}
