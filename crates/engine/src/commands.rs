//! Command structs for engine write operations.
//!
//! These types group parameters for loan and transaction writes, keeping call
//! sites readable and avoiding long argument lists.
//!
//! Patch fields follow one convention: `None` leaves the value untouched; for
//! nullable values `Some(None)` clears it.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Currency, LoanKind, LoanStatus, TransactionKind};

/// Create a loan, optionally together with its origination transaction.
#[derive(Clone, Debug)]
pub struct NewLoanCmd {
    pub kind: LoanKind,
    pub person: String,
    pub total_amount_minor: i64,
    pub currency: Currency,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    /// Wallet the lent money leaves (or the borrowed money enters).
    pub origination_wallet_id: Option<Uuid>,
}

impl NewLoanCmd {
    #[must_use]
    pub fn new(
        kind: LoanKind,
        person: impl Into<String>,
        total_amount_minor: i64,
        currency: Currency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            person: person.into(),
            total_amount_minor,
            currency,
            start_date,
            due_date: None,
            description: None,
            origination_wallet_id: None,
        }
    }

    #[must_use]
    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn originate_from(mut self, wallet_id: Uuid) -> Self {
        self.origination_wallet_id = Some(wallet_id);
        self
    }
}

/// Partial update of a loan.
///
/// `status` accepts `BadDebt` (manual override) and `Active` (clear the
/// override). `Settled` is derived from payments and cannot be forced.
#[derive(Clone, Debug)]
pub struct UpdateLoanCmd {
    pub loan_id: Uuid,
    pub person: Option<String>,
    pub total_amount_minor: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<Option<NaiveDate>>,
    pub description: Option<Option<String>>,
    pub status: Option<LoanStatus>,
}

impl UpdateLoanCmd {
    #[must_use]
    pub fn new(loan_id: Uuid) -> Self {
        Self {
            loan_id,
            person: None,
            total_amount_minor: None,
            start_date: None,
            due_date: None,
            description: None,
            status: None,
        }
    }

    #[must_use]
    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    #[must_use]
    pub fn total_amount_minor(mut self, total_amount_minor: i64) -> Self {
        self.total_amount_minor = Some(total_amount_minor);
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn status(mut self, status: LoanStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Create a transaction, optionally as a repayment of a loan.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub wallet_id: Uuid,
    pub to_wallet_id: Option<Uuid>,
    pub loan_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        amount_minor: i64,
        wallet_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            amount_minor,
            wallet_id,
            to_wallet_id: None,
            loan_id: None,
            occurred_at,
            description: None,
        }
    }

    #[must_use]
    pub fn to_wallet(mut self, wallet_id: Uuid) -> Self {
        self.to_wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn loan(mut self, loan_id: Uuid) -> Self {
        self.loan_id = Some(loan_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a transaction. The kind cannot change.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub amount_minor: Option<i64>,
    pub wallet_id: Option<Uuid>,
    pub to_wallet_id: Option<Uuid>,
    pub loan_id: Option<Option<Uuid>>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid) -> Self {
        Self {
            transaction_id,
            amount_minor: None,
            wallet_id: None,
            to_wallet_id: None,
            loan_id: None,
            occurred_at: None,
            description: None,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn loan(mut self, loan_id: Option<Uuid>) -> Self {
        self.loan_id = Some(loan_id);
        self
    }
}
