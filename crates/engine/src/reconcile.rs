//! Loan reconciliation rules.
//!
//! Pure functions deriving a loan's paid amount and status from the
//! transactions linked to it. `Engine::reconcile_loan` feeds them the current
//! linked set and persists the result.
//!
//! Contributions of a linked transaction to `paid_amount_minor`:
//!
//! | role          | kind                 | contribution |
//! |---------------|----------------------|--------------|
//! | `Origination` | any                  | 0            |
//! | `Repayment`   | loan repayment kind  | `+amount`    |
//! | `Repayment`   | any other kind       | 0            |
//!
//! Writes reject repayment links of any other kind, so the last row only
//! covers rows edited outside the engine. `paid_amount_minor` is never
//! negative.

use crate::{EngineError, LoanKind, LoanRole, LoanStatus, ResultEngine, TransactionKind};

/// Signed contribution of one linked transaction to the loan's paid amount.
pub fn contribution(
    loan_kind: LoanKind,
    role: LoanRole,
    kind: TransactionKind,
    amount_minor: i64,
) -> i64 {
    match role {
        LoanRole::Origination => 0,
        LoanRole::Repayment if kind == loan_kind.repayment_kind() => amount_minor,
        LoanRole::Repayment => 0,
    }
}

/// Sums the contributions of every linked transaction.
pub fn paid_amount<I>(loan_kind: LoanKind, links: I) -> ResultEngine<i64>
where
    I: IntoIterator<Item = (LoanRole, TransactionKind, i64)>,
{
    links
        .into_iter()
        .try_fold(0i64, |acc, (role, kind, amount_minor)| {
            acc.checked_add(contribution(loan_kind, role, kind, amount_minor))
        })
        .ok_or_else(|| EngineError::InvalidAmount("paid amount overflow".to_string()))
}

/// Derives a loan status from its payments.
///
/// The paid amount is clamped to `[0, total]` before comparing, so
/// overpayments still settle the loan. A manual `BadDebt` sticks while the
/// loan is not fully repaid; a full repayment recovers it to `Settled`.
pub fn derive_status(previous: LoanStatus, paid_minor: i64, total_minor: i64) -> LoanStatus {
    let clamped = paid_minor.max(0).min(total_minor.max(0));
    if total_minor > 0 && clamped >= total_minor {
        return LoanStatus::Settled;
    }
    match previous {
        LoanStatus::BadDebt => LoanStatus::BadDebt,
        LoanStatus::Active | LoanStatus::Settled => LoanStatus::Active,
    }
}
