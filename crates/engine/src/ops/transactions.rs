use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    EngineError, Loan, LoanLink, LoanRole, NewTransactionCmd, ResultEngine, Transaction,
    TransactionKind, UpdateTransactionCmd, Wallet, transactions,
    util::{ensure_positive_amount, ensure_same_currency},
};

use super::{Engine, normalize_optional_text, with_tx};

mod list;

pub use list::TransactionListFilter;

/// Checks the wallet shape of a transaction: transfers need a distinct
/// destination, everything else must not have one.
fn validate_targets(
    kind: TransactionKind,
    wallet_id: Uuid,
    to_wallet_id: Option<Uuid>,
) -> ResultEngine<()> {
    match (kind, to_wallet_id) {
        (TransactionKind::Transfer, None) => Err(EngineError::validation(
            "to_wallet_id",
            "required for transfers",
        )),
        (TransactionKind::Transfer, Some(to)) if to == wallet_id => Err(
            EngineError::validation("to_wallet_id", "must differ from wallet_id"),
        ),
        (TransactionKind::Income | TransactionKind::Expense, Some(_)) => Err(
            EngineError::validation("to_wallet_id", "only allowed for transfers"),
        ),
        _ => Ok(()),
    }
}

fn ensure_linkable(kind: TransactionKind) -> ResultEngine<()> {
    if kind == TransactionKind::Transfer {
        return Err(EngineError::validation(
            "loan_id",
            "transfers cannot be linked to a loan",
        ));
    }
    Ok(())
}

/// A repayment must move money the opposite way of the loan's origination.
fn ensure_repayment_kind(loan: &Loan, kind: TransactionKind) -> ResultEngine<()> {
    if kind != loan.kind.repayment_kind() {
        return Err(EngineError::validation(
            "loan_id",
            format!(
                "a {} loan is repaid by {} transactions",
                loan.kind.as_str(),
                loan.kind.repayment_kind().as_str()
            ),
        ));
    }
    Ok(())
}

impl Engine {
    /// Records a money movement.
    ///
    /// With a `loan_id` the transaction becomes a `Repayment` of that loan and
    /// must have the loan's repayment kind. The loan is reconciled before
    /// returning; wallet balances are
    /// recomputed as well. Everything happens in one DB transaction.
    pub async fn create_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<Transaction> {
        ensure_positive_amount("amount_minor", cmd.amount_minor)?;
        validate_targets(cmd.kind, cmd.wallet_id, cmd.to_wallet_id)?;
        if cmd.loan_id.is_some() {
            ensure_linkable(cmd.kind)?;
        }

        let mut tx = Transaction::new(cmd.kind, cmd.amount_minor, cmd.wallet_id, cmd.occurred_at)?;
        tx.to_wallet_id = cmd.to_wallet_id;
        tx.description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            let wallet = self.require_open_wallet(&db_tx, tx.wallet_id).await?;
            self.check_destination(&db_tx, &wallet, tx.to_wallet_id)
                .await?;

            if let Some(loan_id) = cmd.loan_id {
                let loan = Loan::try_from(self.lock_loan(&db_tx, loan_id).await?)?;
                ensure_same_currency("loan", loan.currency, wallet.currency)?;
                ensure_repayment_kind(&loan, tx.kind)?;
                tx.loan = Some(LoanLink {
                    loan_id,
                    role: LoanRole::Repayment,
                });
            }

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            self.recompute_wallet_balances(&db_tx, tx.touched_wallets())
                .await?;

            if let Some(loan_id) = tx.loan_id() {
                self.reconcile_loan_in(&db_tx, loan_id)
                    .await
                    .map_err(|err| err.into_dependency_failure("loan reconciliation"))?;
            }

            tracing::debug!(transaction_id = %tx.id, kind = tx.kind.as_str(), "transaction created");
            Ok(tx)
        })
    }

    /// Return a transaction snapshot from DB.
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self.require_transaction(&db_tx, transaction_id).await?;
            Transaction::try_from(model)
        })
    }

    /// Updates amount, wallets, loan link, date and/or description.
    ///
    /// When the loan link changes both the previous and the new loan are
    /// reconciled. An `Origination` transaction stays attached to its loan,
    /// and a repayment may only point at a loan it actually repays.
    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        if let Some(amount_minor) = cmd.amount_minor {
            ensure_positive_amount("amount_minor", amount_minor)?;
        }

        with_tx!(self, |db_tx| {
            let before =
                Transaction::try_from(self.require_transaction(&db_tx, cmd.transaction_id).await?)?;
            let mut after = before.clone();

            if let Some(amount_minor) = cmd.amount_minor {
                after.amount_minor = amount_minor;
            }
            if let Some(wallet_id) = cmd.wallet_id {
                after.wallet_id = wallet_id;
            }
            if let Some(to_wallet_id) = cmd.to_wallet_id {
                after.to_wallet_id = Some(to_wallet_id);
            }
            if let Some(occurred_at) = cmd.occurred_at {
                after.occurred_at = occurred_at;
            }
            if let Some(description) = cmd.description.as_ref() {
                after.description = normalize_optional_text(description.as_deref());
            }
            validate_targets(after.kind, after.wallet_id, after.to_wallet_id)?;

            if let Some(new_loan_id) = cmd.loan_id
                && new_loan_id != before.loan_id()
            {
                if before
                    .loan
                    .is_some_and(|link| link.role == LoanRole::Origination)
                {
                    return Err(EngineError::validation(
                        "loan_id",
                        "origination transactions cannot be relinked",
                    ));
                }
                after.loan = new_loan_id.map(|loan_id| LoanLink {
                    loan_id,
                    role: LoanRole::Repayment,
                });
            }

            let wallet = if after.wallet_id == before.wallet_id {
                Wallet::try_from(self.require_wallet(&db_tx, after.wallet_id).await?)?
            } else {
                self.require_open_wallet(&db_tx, after.wallet_id).await?
            };
            if after.to_wallet_id != before.to_wallet_id {
                self.check_destination(&db_tx, &wallet, after.to_wallet_id)
                    .await?;
            }

            let loan_ids: BTreeSet<Uuid> =
                before.loan_id().into_iter().chain(after.loan_id()).collect();
            // Ascending id order, so two writers relinking between the same
            // pair of loans cannot deadlock.
            let mut locked = BTreeMap::new();
            for &loan_id in &loan_ids {
                locked.insert(loan_id, self.lock_loan(&db_tx, loan_id).await?);
            }
            if let Some(link) = after.loan {
                ensure_linkable(after.kind)?;
                let model = locked
                    .remove(&link.loan_id)
                    .ok_or_else(|| EngineError::KeyNotFound("loan not exists".to_string()))?;
                let loan = Loan::try_from(model)?;
                ensure_same_currency("loan", loan.currency, wallet.currency)?;
                if link.role == LoanRole::Repayment {
                    ensure_repayment_kind(&loan, after.kind)?;
                }
            }

            transactions::ActiveModel::from(&after).update(&db_tx).await?;
            self.recompute_wallet_balances(
                &db_tx,
                before.touched_wallets().chain(after.touched_wallets()),
            )
            .await?;

            for loan_id in loan_ids {
                self.reconcile_loan_in(&db_tx, loan_id)
                    .await
                    .map_err(|err| err.into_dependency_failure("loan reconciliation"))?;
            }

            Ok(after)
        })
    }

    /// Deletes a transaction and reconciles the loan it was linked to.
    pub async fn delete_transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let tx =
                Transaction::try_from(self.require_transaction(&db_tx, transaction_id).await?)?;

            transactions::Entity::delete_by_id(tx.id.to_string())
                .exec(&db_tx)
                .await?;
            self.recompute_wallet_balances(&db_tx, tx.touched_wallets())
                .await?;

            if let Some(loan_id) = tx.loan_id() {
                self.reconcile_loan_in(&db_tx, loan_id)
                    .await
                    .map_err(|err| err.into_dependency_failure("loan reconciliation"))?;
            }

            tracing::debug!(%transaction_id, "transaction deleted");
            Ok(tx)
        })
    }

    async fn require_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Transfers must land in an open wallet with the same currency.
    async fn check_destination(
        &self,
        db_tx: &DatabaseTransaction,
        source: &Wallet,
        to_wallet_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        if let Some(to_wallet_id) = to_wallet_id {
            let destination = self.require_open_wallet(db_tx, to_wallet_id).await?;
            ensure_same_currency("wallet", source.currency, destination.currency)?;
        }
        Ok(())
    }
}
