//! Loans and debts.
//!
//! A `Loan` records money lent to (or borrowed from) a counterparty. Its
//! `paid_amount_minor` and `status` are owned by reconciliation: they are
//! recomputed from the transactions linked to the loan and never edited in
//! place.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine, TransactionKind,
    util::{model_currency, parse_uuid},
};

/// Direction of a loan, seen from the owner of the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    /// Money went out to the counterparty and is expected back.
    Lend,
    /// Money came in from the counterparty and must be paid back.
    Borrow,
}

impl LoanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lend => "lend",
            Self::Borrow => "borrow",
        }
    }

    /// Kind of the money movement that creates the debt.
    pub fn origination_kind(self) -> TransactionKind {
        match self {
            Self::Lend => TransactionKind::Expense,
            Self::Borrow => TransactionKind::Income,
        }
    }

    /// Kind of the money movement that reduces the debt.
    pub fn repayment_kind(self) -> TransactionKind {
        match self {
            Self::Lend => TransactionKind::Income,
            Self::Borrow => TransactionKind::Expense,
        }
    }
}

impl TryFrom<&str> for LoanKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "lend" => Ok(Self::Lend),
            "borrow" => Ok(Self::Borrow),
            other => Err(EngineError::validation(
                "kind",
                format!("invalid loan kind: {other}"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Settled,
    /// Only ever set by an explicit override.
    BadDebt,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Settled => "settled",
            Self::BadDebt => "bad_debt",
        }
    }
}

impl TryFrom<&str> for LoanStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "settled" => Ok(Self::Settled),
            "bad_debt" => Ok(Self::BadDebt),
            other => Err(EngineError::validation(
                "status",
                format!("invalid loan status: {other}"),
            )),
        }
    }
}

/// How a transaction is linked to a loan.
///
/// The role is fixed when the link is created. It is never inferred from the
/// transaction kind: an `expense` can be the origination of a lend as well as
/// the repayment of a borrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanRole {
    Origination,
    Repayment,
}

impl LoanRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Origination => "origination",
            Self::Repayment => "repayment",
        }
    }
}

impl TryFrom<&str> for LoanRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "origination" => Ok(Self::Origination),
            "repayment" => Ok(Self::Repayment),
            other => Err(EngineError::validation(
                "loan_role",
                format!("invalid loan role: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub kind: LoanKind,
    pub person: String,
    pub total_amount_minor: i64,
    pub paid_amount_minor: i64,
    pub currency: Currency,
    pub status: LoanStatus,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Builds a fresh loan: nothing paid yet, `Active`.
    pub fn new(
        kind: LoanKind,
        person: String,
        total_amount_minor: i64,
        currency: Currency,
        start_date: NaiveDate,
    ) -> ResultEngine<Self> {
        if total_amount_minor <= 0 {
            return Err(EngineError::validation("total_amount_minor", "must be > 0"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            person,
            total_amount_minor,
            paid_amount_minor: 0,
            currency,
            status: LoanStatus::Active,
            start_date,
            due_date: None,
            description: None,
            created_at: Utc::now(),
        })
    }

    /// Outstanding amount; 0 once the loan is fully (or over) paid.
    pub fn remaining_minor(&self) -> i64 {
        self.total_amount_minor
            .saturating_sub(self.paid_amount_minor)
            .max(0)
    }

    /// Repayment progress in percent, capped at 100 on overpayment.
    pub fn progress_percent(&self) -> u8 {
        if self.total_amount_minor <= 0 {
            return 0;
        }
        let paid = i128::from(self.paid_amount_minor.max(0));
        let percent = paid * 100 / i128::from(self.total_amount_minor);
        percent.min(100) as u8
    }

    /// A loan is overdue when its due date has passed and it is not settled.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != LoanStatus::Settled && self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub person: String,
    pub total_amount_minor: i64,
    pub paid_amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub start_date: Date,
    pub due_date: Option<Date>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Loan> for ActiveModel {
    fn from(loan: &Loan) -> Self {
        Self {
            id: ActiveValue::Set(loan.id.to_string()),
            kind: ActiveValue::Set(loan.kind.as_str().to_string()),
            person: ActiveValue::Set(loan.person.clone()),
            total_amount_minor: ActiveValue::Set(loan.total_amount_minor),
            paid_amount_minor: ActiveValue::Set(loan.paid_amount_minor),
            currency: ActiveValue::Set(loan.currency.code().to_string()),
            status: ActiveValue::Set(loan.status.as_str().to_string()),
            start_date: ActiveValue::Set(loan.start_date),
            due_date: ActiveValue::Set(loan.due_date),
            description: ActiveValue::Set(loan.description.clone()),
            created_at: ActiveValue::Set(loan.created_at),
        }
    }
}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "loan")?,
            kind: LoanKind::try_from(model.kind.as_str())?,
            currency: model_currency(&model.currency)?,
            status: LoanStatus::try_from(model.status.as_str())?,
            person: model.person,
            total_amount_minor: model.total_amount_minor,
            paid_amount_minor: model.paid_amount_minor,
            start_date: model.start_date,
            due_date: model.due_date,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
