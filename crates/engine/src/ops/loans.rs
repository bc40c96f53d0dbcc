use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    EngineError, Loan, LoanKind, LoanLink, LoanRole, LoanStatus, Money, NewLoanCmd,
    ResultEngine, Transaction, UpdateLoanCmd, loans, transactions,
    util::{ensure_positive_amount, ensure_same_currency},
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

/// Filters for listing loans. Empty filter lists everything.
#[derive(Clone, Debug, Default)]
pub struct LoanListFilter {
    pub status: Option<LoanStatus>,
    pub kind: Option<LoanKind>,
}

fn validate_dates(start_date: NaiveDate, due_date: Option<NaiveDate>) -> ResultEngine<()> {
    if let Some(due) = due_date
        && due < start_date
    {
        return Err(EngineError::validation(
            "due_date",
            "must not be before start_date",
        ));
    }
    Ok(())
}

fn origination_note(kind: LoanKind, person: &str) -> String {
    match kind {
        LoanKind::Lend => format!("Lent to {person}"),
        LoanKind::Borrow => format!("Borrowed from {person}"),
    }
}

impl Engine {
    /// Creates a loan, `Active` with nothing paid.
    ///
    /// With `origination_wallet_id` the money movement that creates the debt
    /// is recorded in the same DB transaction, tagged `Origination` so it
    /// never counts as a repayment. Storage failures after the loan row is
    /// written surface as `DependencyWriteFailure` and nothing is kept.
    pub async fn create_loan(&self, cmd: NewLoanCmd) -> ResultEngine<Loan> {
        let person = normalize_required_text(&cmd.person, "person")?;
        ensure_positive_amount("total_amount_minor", cmd.total_amount_minor)?;
        validate_dates(cmd.start_date, cmd.due_date)?;

        let mut loan = Loan::new(
            cmd.kind,
            person,
            cmd.total_amount_minor,
            cmd.currency,
            cmd.start_date,
        )?;
        loan.due_date = cmd.due_date;
        loan.description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            let origination_wallet = match cmd.origination_wallet_id {
                Some(wallet_id) => {
                    let wallet = self.require_open_wallet(&db_tx, wallet_id).await?;
                    ensure_same_currency("loan", loan.currency, wallet.currency)?;
                    Some(wallet)
                }
                None => None,
            };

            loans::ActiveModel::from(&loan).insert(&db_tx).await?;

            let loan = match origination_wallet {
                Some(wallet) => self
                    .record_origination(&db_tx, &loan, wallet.id)
                    .await
                    .map_err(|err| err.into_dependency_failure("loan origination"))?,
                None => loan,
            };

            tracing::info!(
                loan_id = %loan.id,
                kind = loan.kind.as_str(),
                total = %Money::new(loan.total_amount_minor, loan.currency),
                "loan created"
            );
            Ok(loan)
        })
    }

    async fn record_origination(
        &self,
        db_tx: &DatabaseTransaction,
        loan: &Loan,
        wallet_id: Uuid,
    ) -> ResultEngine<Loan> {
        let occurred_at = loan.start_date.and_time(NaiveTime::MIN).and_utc();
        let mut tx = Transaction::new(
            loan.kind.origination_kind(),
            loan.total_amount_minor,
            wallet_id,
            occurred_at,
        )?;
        tx.description = Some(origination_note(loan.kind, &loan.person));
        tx.loan = Some(LoanLink {
            loan_id: loan.id,
            role: LoanRole::Origination,
        });

        transactions::ActiveModel::from(&tx).insert(db_tx).await?;
        self.recompute_wallet_balances(db_tx, tx.touched_wallets())
            .await?;
        self.reconcile_loan_in(db_tx, loan.id).await
    }

    /// Return a loan snapshot from DB.
    pub async fn loan(&self, loan_id: Uuid) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            let model = loans::Entity::find_by_id(loan_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("loan not exists".to_string()))?;
            Loan::try_from(model)
        })
    }

    /// Lists loans, most recent start date first.
    pub async fn list_loans(&self, filter: &LoanListFilter) -> ResultEngine<Vec<Loan>> {
        with_tx!(self, |db_tx| {
            let mut query = loans::Entity::find()
                .order_by_desc(loans::Column::StartDate)
                .order_by_desc(loans::Column::CreatedAt);
            if let Some(status) = filter.status {
                query = query.filter(loans::Column::Status.eq(status.as_str()));
            }
            if let Some(kind) = filter.kind {
                query = query.filter(loans::Column::Kind.eq(kind.as_str()));
            }
            let models = query.all(&db_tx).await?;
            models
                .into_iter()
                .map(Loan::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Edits a loan.
    ///
    /// Editing the total or the status re-runs reconciliation, so the stored
    /// status always agrees with the payments. A `BadDebt` override on a loan
    /// already repaid in full (against the edited total) is rejected.
    pub async fn update_loan(&self, cmd: UpdateLoanCmd) -> ResultEngine<Loan> {
        let person = cmd
            .person
            .as_deref()
            .map(|p| normalize_required_text(p, "person"))
            .transpose()?;
        if let Some(total) = cmd.total_amount_minor {
            ensure_positive_amount("total_amount_minor", total)?;
        }
        if cmd.status == Some(LoanStatus::Settled) {
            return Err(EngineError::validation(
                "status",
                "settled is derived from repayments and cannot be set",
            ));
        }

        with_tx!(self, |db_tx| {
            let mut loan = Loan::try_from(self.lock_loan(&db_tx, cmd.loan_id).await?)?;

            if let Some(person) = person {
                loan.person = person;
            }
            if let Some(total) = cmd.total_amount_minor {
                loan.total_amount_minor = total;
            }
            if let Some(start_date) = cmd.start_date {
                loan.start_date = start_date;
            }
            if let Some(due_date) = cmd.due_date {
                loan.due_date = due_date;
            }
            if let Some(description) = cmd.description.as_ref() {
                loan.description = normalize_optional_text(description.as_deref());
            }
            if let Some(status) = cmd.status {
                loan.status = status;
            }
            validate_dates(loan.start_date, loan.due_date)?;
            if cmd.status == Some(LoanStatus::BadDebt)
                && loan.paid_amount_minor >= loan.total_amount_minor
            {
                return Err(EngineError::validation(
                    "status",
                    "loan is fully repaid and cannot be marked bad_debt",
                ));
            }
            if let Some(status) = cmd.status {
                tracing::info!(loan_id = %loan.id, status = status.as_str(), "loan status override");
            }

            let active = loans::ActiveModel {
                id: ActiveValue::Set(loan.id.to_string()),
                person: ActiveValue::Set(loan.person.clone()),
                total_amount_minor: ActiveValue::Set(loan.total_amount_minor),
                status: ActiveValue::Set(loan.status.as_str().to_string()),
                start_date: ActiveValue::Set(loan.start_date),
                due_date: ActiveValue::Set(loan.due_date),
                description: ActiveValue::Set(loan.description.clone()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            if cmd.total_amount_minor.is_some() || cmd.status.is_some() {
                self.reconcile_loan_in(&db_tx, loan.id).await
            } else {
                Ok(loan)
            }
        })
    }

    /// Deletes a loan without losing its money movements.
    ///
    /// Linked transactions are unlinked first, then the loan row is removed;
    /// both happen in one DB transaction. Returns how many transactions were
    /// unlinked.
    pub async fn delete_loan(&self, loan_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            self.lock_loan(&db_tx, loan_id).await?;

            let unlinked = transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::LoanId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    transactions::Column::LoanRole,
                    Expr::value(Option::<String>::None),
                )
                .filter(transactions::Column::LoanId.eq(loan_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            loans::Entity::delete_by_id(loan_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(%loan_id, unlinked, "loan deleted");
            Ok(unlinked)
        })
    }
}
