use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Myr,
    Sgd,
    Usd,
    Eur,
    Cny,
}

/// Distinguishes a missing field from an explicit `null` in PATCH bodies.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// missing is `None`, `null` is `Some(None)`, a value is `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod error {
    use super::*;

    /// Body of every non-2xx response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: String,
        /// Offending field, for validation errors.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub field: Option<String>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletUpdate {
        pub name: Option<String>,
        pub archived: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletListQuery {
        pub include_archived: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub name: String,
        pub currency: Currency,
        pub balance_minor: i64,
        pub archived: bool,
        pub created_at: DateTime<Utc>,
    }
}

pub mod loan {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanKind {
        Lend,
        Borrow,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanStatus {
        Active,
        Settled,
        BadDebt,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanRole {
        Origination,
        Repayment,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanNew {
        pub kind: LoanKind,
        pub person: String,
        /// Must be > 0.
        pub total_amount_minor: i64,
        pub currency: Option<Currency>,
        pub start_date: NaiveDate,
        pub due_date: Option<NaiveDate>,
        pub description: Option<String>,
        /// If present, the money movement creating the debt is recorded on
        /// this wallet together with the loan.
        pub wallet_id: Option<Uuid>,
    }

    /// Partial update. `status` accepts `active` or `bad_debt` only.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LoanUpdate {
        pub person: Option<String>,
        pub total_amount_minor: Option<i64>,
        pub start_date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "double_option")]
        pub due_date: Option<Option<NaiveDate>>,
        #[serde(default, deserialize_with = "double_option")]
        pub description: Option<Option<String>>,
        pub status: Option<LoanStatus>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LoanListQuery {
        pub status: Option<LoanStatus>,
        pub kind: Option<LoanKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanView {
        pub id: Uuid,
        pub kind: LoanKind,
        pub person: String,
        pub total_amount_minor: i64,
        pub paid_amount_minor: i64,
        pub remaining_minor: i64,
        /// 0..=100
        pub progress_percent: u8,
        pub currency: Currency,
        pub status: LoanStatus,
        pub start_date: NaiveDate,
        pub due_date: Option<NaiveDate>,
        pub overdue: bool,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanDeleted {
        pub id: Uuid,
        pub unlinked_transactions: u64,
    }
}

pub mod positions {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PositionsQuery {
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanPositionsView {
        /// Echoes the filter; `None` means all currencies were summed.
        pub currency: Option<Currency>,
        pub total_receivable_minor: i64,
        pub total_payable_minor: i64,
        pub net_position_minor: i64,
        pub loan_count: u64,
        pub integrity_warnings: u64,
    }
}

pub mod transaction {
    use super::*;
    use crate::loan::LoanRole;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        /// Must be > 0. The kind defines the direction.
        pub amount_minor: i64,
        pub wallet_id: Uuid,
        /// Required for transfers, rejected otherwise.
        pub to_wallet_id: Option<Uuid>,
        /// Links the transaction to a loan as a repayment.
        pub loan_id: Option<Uuid>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
    }

    /// Partial update. The kind cannot change.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount_minor: Option<i64>,
        pub wallet_id: Option<Uuid>,
        pub to_wallet_id: Option<Uuid>,
        /// `null` unlinks the transaction from its loan.
        #[serde(default, deserialize_with = "double_option")]
        pub loan_id: Option<Option<Uuid>>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        #[serde(default, deserialize_with = "double_option")]
        pub description: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub wallet_id: Option<Uuid>,
        pub loan_id: Option<Uuid>,
        pub kind: Option<TransactionKind>,
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub wallet_id: Uuid,
        pub to_wallet_id: Option<Uuid>,
        pub loan_id: Option<Uuid>,
        pub loan_role: Option<LoanRole>,
        pub occurred_at: DateTime<Utc>,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}
