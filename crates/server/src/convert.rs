//! Mapping between engine types and wire types.

use api_types::{
    Currency as ApiCurrency,
    loan::{LoanKind as ApiLoanKind, LoanRole as ApiLoanRole, LoanStatus as ApiLoanStatus, LoanView},
    transaction::{TransactionKind as ApiKind, TransactionView},
    wallet::WalletView,
};
use chrono::Utc;

pub(crate) fn currency_to_api(currency: engine::Currency) -> ApiCurrency {
    match currency {
        engine::Currency::Myr => ApiCurrency::Myr,
        engine::Currency::Sgd => ApiCurrency::Sgd,
        engine::Currency::Usd => ApiCurrency::Usd,
        engine::Currency::Eur => ApiCurrency::Eur,
        engine::Currency::Cny => ApiCurrency::Cny,
    }
}

pub(crate) fn currency_from_api(currency: ApiCurrency) -> engine::Currency {
    match currency {
        ApiCurrency::Myr => engine::Currency::Myr,
        ApiCurrency::Sgd => engine::Currency::Sgd,
        ApiCurrency::Usd => engine::Currency::Usd,
        ApiCurrency::Eur => engine::Currency::Eur,
        ApiCurrency::Cny => engine::Currency::Cny,
    }
}

pub(crate) fn loan_kind_from_api(kind: ApiLoanKind) -> engine::LoanKind {
    match kind {
        ApiLoanKind::Lend => engine::LoanKind::Lend,
        ApiLoanKind::Borrow => engine::LoanKind::Borrow,
    }
}

pub(crate) fn loan_status_from_api(status: ApiLoanStatus) -> engine::LoanStatus {
    match status {
        ApiLoanStatus::Active => engine::LoanStatus::Active,
        ApiLoanStatus::Settled => engine::LoanStatus::Settled,
        ApiLoanStatus::BadDebt => engine::LoanStatus::BadDebt,
    }
}

pub(crate) fn kind_from_api(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
        ApiKind::Transfer => engine::TransactionKind::Transfer,
    }
}

fn kind_to_api(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
        engine::TransactionKind::Transfer => ApiKind::Transfer,
    }
}

pub(crate) fn wallet_view(wallet: engine::Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name,
        currency: currency_to_api(wallet.currency),
        balance_minor: wallet.balance_minor,
        archived: wallet.archived,
        created_at: wallet.created_at,
    }
}

pub(crate) fn loan_view(loan: engine::Loan) -> LoanView {
    let today = Utc::now().date_naive();
    LoanView {
        id: loan.id,
        kind: match loan.kind {
            engine::LoanKind::Lend => ApiLoanKind::Lend,
            engine::LoanKind::Borrow => ApiLoanKind::Borrow,
        },
        remaining_minor: loan.remaining_minor(),
        progress_percent: loan.progress_percent(),
        overdue: loan.is_overdue(today),
        status: match loan.status {
            engine::LoanStatus::Active => ApiLoanStatus::Active,
            engine::LoanStatus::Settled => ApiLoanStatus::Settled,
            engine::LoanStatus::BadDebt => ApiLoanStatus::BadDebt,
        },
        person: loan.person,
        total_amount_minor: loan.total_amount_minor,
        paid_amount_minor: loan.paid_amount_minor,
        currency: currency_to_api(loan.currency),
        start_date: loan.start_date,
        due_date: loan.due_date,
        description: loan.description,
        created_at: loan.created_at,
    }
}

pub(crate) fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: kind_to_api(tx.kind),
        amount_minor: tx.amount_minor,
        wallet_id: tx.wallet_id,
        to_wallet_id: tx.to_wallet_id,
        loan_id: tx.loan.map(|link| link.loan_id),
        loan_role: tx.loan.map(|link| match link.role {
            engine::LoanRole::Origination => ApiLoanRole::Origination,
            engine::LoanRole::Repayment => ApiLoanRole::Repayment,
        }),
        occurred_at: tx.occurred_at,
        description: tx.description,
        created_at: tx.created_at,
    }
}
