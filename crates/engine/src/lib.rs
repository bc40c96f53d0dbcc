//! Dompet engine: wallets, transactions and the loans ledger.
//!
//! All writes go through [`Engine`], which runs each operation inside a single
//! database transaction. Loan balances and wallet balances are denormalized
//! values recomputed from the transactions on every write.

pub use commands::{NewLoanCmd, NewTransactionCmd, UpdateLoanCmd, UpdateTransactionCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use loans::{Loan, LoanKind, LoanRole, LoanStatus};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, LoanListFilter, TransactionListFilter};
pub use positions::LoanPositions;
pub use transactions::{LoanLink, Transaction, TransactionKind};
pub use wallets::Wallet;

pub mod reconcile;

mod commands;
mod currency;
mod error;
mod loans;
mod money;
mod ops;
mod positions;
mod transactions;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
