//! Transaction primitives.
//!
//! A `Transaction` is a money movement on one wallet (or between two wallets
//! for transfers), optionally linked to a loan.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, LoanRole, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::validation(
                "kind",
                format!("invalid transaction kind: {other}"),
            )),
        }
    }
}

/// Reference from a transaction to a loan, tagged with its role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLink {
    pub loan_id: Uuid,
    pub role: LoanRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub wallet_id: Uuid,
    /// Destination wallet, only for `Transfer`.
    pub to_wallet_id: Option<Uuid>,
    pub loan: Option<LoanLink>,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount_minor: i64,
        wallet_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::validation("amount_minor", "must be > 0"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount_minor,
            wallet_id,
            to_wallet_id: None,
            loan: None,
            occurred_at,
            description: None,
            created_at: Utc::now(),
        })
    }

    pub fn loan_id(&self) -> Option<Uuid> {
        self.loan.map(|link| link.loan_id)
    }

    /// Wallets whose balance depends on this transaction.
    pub fn touched_wallets(&self) -> impl Iterator<Item = Uuid> + '_ {
        std::iter::once(self.wallet_id).chain(self.to_wallet_id)
    }

    /// Signed effect of this transaction on `wallet_id`'s balance.
    pub fn wallet_delta(&self, wallet_id: Uuid) -> i64 {
        let mut delta = 0;
        if self.wallet_id == wallet_id {
            delta += match self.kind {
                TransactionKind::Income => self.amount_minor,
                TransactionKind::Expense | TransactionKind::Transfer => -self.amount_minor,
            };
        }
        if self.kind == TransactionKind::Transfer && self.to_wallet_id == Some(wallet_id) {
            delta += self.amount_minor;
        }
        delta
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub wallet_id: String,
    pub to_wallet_id: Option<String>,
    pub loan_id: Option<String>,
    pub loan_role: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loans::Entity",
        from = "Column::LoanId",
        to = "super::loans::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Loans,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            to_wallet_id: ActiveValue::Set(tx.to_wallet_id.map(|id| id.to_string())),
            loan_id: ActiveValue::Set(tx.loan.map(|link| link.loan_id.to_string())),
            loan_role: ActiveValue::Set(tx.loan.map(|link| link.role.as_str().to_string())),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let loan = match (model.loan_id.as_deref(), model.loan_role.as_deref()) {
            (Some(loan_id), Some(role)) => Some(LoanLink {
                loan_id: parse_uuid(loan_id, "loan")?,
                role: LoanRole::try_from(role)?,
            }),
            (None, None) => None,
            _ => {
                return Err(EngineError::validation(
                    "loan_role",
                    format!("transaction {} has an incomplete loan link", model.id),
                ));
            }
        };

        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            to_wallet_id: model
                .to_wallet_id
                .as_deref()
                .map(|id| parse_uuid(id, "wallet"))
                .transpose()?,
            loan,
            occurred_at: model.occurred_at,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
