use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Currency, Engine, EngineError, LoanKind, LoanListFilter, LoanRole, LoanStatus, NewLoanCmd,
    NewTransactionCmd, TransactionKind, TransactionListFilter, UpdateLoanCmd,
    UpdateTransactionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
}

async fn cash(engine: &Engine) -> Uuid {
    engine.new_wallet("Cash", Currency::Myr).await.unwrap().id
}

async fn repay(engine: &Engine, kind: TransactionKind, amount: i64, wallet: Uuid, loan: Uuid) -> Uuid {
    engine
        .create_transaction(NewTransactionCmd::new(kind, amount, wallet, at(10)).loan(loan))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn lend_is_settled_only_by_repayments() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    engine
        .create_transaction(NewTransactionCmd::new(
            TransactionKind::Income,
            500_000,
            wallet,
            at(1),
        ))
        .await
        .unwrap();

    let loan = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Lend, "Alice", 100_000, Currency::Myr, march(1))
                .originate_from(wallet),
        )
        .await
        .unwrap();
    assert_eq!(loan.paid_amount_minor, 0);
    assert_eq!(loan.status, LoanStatus::Active);
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, 400_000);

    let (linked, _) = engine
        .list_transactions_page(
            &TransactionListFilter {
                loan_id: Some(loan.id),
                ..Default::default()
            },
            10,
            None,
        )
        .await
        .unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].kind, TransactionKind::Expense);
    assert_eq!(linked[0].loan.unwrap().role, LoanRole::Origination);
    assert_eq!(linked[0].description.as_deref(), Some("Lent to Alice"));

    repay(&engine, TransactionKind::Income, 40_000, wallet, loan.id).await;
    let loan_now = engine.loan(loan.id).await.unwrap();
    assert_eq!(loan_now.paid_amount_minor, 40_000);
    assert_eq!(loan_now.status, LoanStatus::Active);
    assert_eq!(loan_now.remaining_minor(), 60_000);
    assert_eq!(loan_now.progress_percent(), 40);

    repay(&engine, TransactionKind::Income, 60_000, wallet, loan.id).await;
    let loan_now = engine.loan(loan.id).await.unwrap();
    assert_eq!(loan_now.paid_amount_minor, 100_000);
    assert_eq!(loan_now.status, LoanStatus::Settled);
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, 500_000);
}

#[tokio::test]
async fn bad_debt_recovers_when_fully_repaid() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Borrow, "Bank", 50_000, Currency::Myr, march(1))
                .originate_from(wallet),
        )
        .await
        .unwrap();
    assert_eq!(loan.paid_amount_minor, 0);
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, 50_000);

    let loan = engine
        .update_loan(UpdateLoanCmd::new(loan.id).status(LoanStatus::BadDebt))
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::BadDebt);
    assert_eq!(loan.paid_amount_minor, 0);

    repay(&engine, TransactionKind::Expense, 20_000, wallet, loan.id).await;
    assert_eq!(
        engine.loan(loan.id).await.unwrap().status,
        LoanStatus::BadDebt
    );

    repay(&engine, TransactionKind::Expense, 30_000, wallet, loan.id).await;
    let loan = engine.loan(loan.id).await.unwrap();
    assert_eq!(loan.paid_amount_minor, 50_000);
    assert_eq!(loan.status, LoanStatus::Settled);
}

#[tokio::test]
async fn bad_debt_cannot_be_set_on_a_repaid_loan() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Omar",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    repay(&engine, TransactionKind::Income, 10_000, wallet, loan.id).await;

    let err = engine
        .update_loan(UpdateLoanCmd::new(loan.id).status(LoanStatus::BadDebt))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("status"));
    assert_eq!(
        engine.loan(loan.id).await.unwrap().status,
        LoanStatus::Settled
    );

    // Raising the total in the same edit leaves something to write off.
    let loan = engine
        .update_loan(
            UpdateLoanCmd::new(loan.id)
                .total_amount_minor(12_000)
                .status(LoanStatus::BadDebt),
        )
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::BadDebt);

    // Lowering it back to the paid amount does not.
    let err = engine
        .update_loan(
            UpdateLoanCmd::new(loan.id)
                .total_amount_minor(10_000)
                .status(LoanStatus::BadDebt),
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("status"));
    assert_eq!(engine.loan(loan.id).await.unwrap().total_amount_minor, 12_000);
}

#[tokio::test]
async fn status_override_rules() {
    let (engine, _db) = engine_with_db().await;
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Bob",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();

    let err = engine
        .update_loan(UpdateLoanCmd::new(loan.id).status(LoanStatus::Settled))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("status"));

    engine
        .update_loan(UpdateLoanCmd::new(loan.id).status(LoanStatus::BadDebt))
        .await
        .unwrap();
    let loan = engine
        .update_loan(UpdateLoanCmd::new(loan.id).status(LoanStatus::Active))
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Active);
}

#[tokio::test]
async fn lowering_the_total_settles_the_loan() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Carol",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    repay(&engine, TransactionKind::Income, 6_000, wallet, loan.id).await;

    let loan = engine
        .update_loan(UpdateLoanCmd::new(loan.id).total_amount_minor(6_000))
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Settled);
}

#[tokio::test]
async fn non_positive_total_is_rejected_without_writing() {
    let (engine, _db) = engine_with_db().await;

    for total in [0, -5] {
        let err = engine
            .create_loan(NewLoanCmd::new(
                LoanKind::Lend,
                "Alice",
                total,
                Currency::Myr,
                march(1),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("total_amount_minor"));
    }
    let loans = engine.list_loans(&LoanListFilter::default()).await.unwrap();
    assert!(loans.is_empty());
}

#[tokio::test]
async fn due_date_before_start_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Lend, "Alice", 1_000, Currency::Myr, march(10))
                .due_date(march(5)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("due_date"));
}

#[tokio::test]
async fn origination_from_other_currency_wallet_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let usd = engine.new_wallet("Dollars", Currency::Usd).await.unwrap();

    let err = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Lend, "Alice", 1_000, Currency::Myr, march(1))
                .originate_from(usd.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert!(
        engine
            .list_loans(&LoanListFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn origination_failure_rolls_back_the_loan() {
    let (engine, db) = engine_with_db().await;
    let wallet = cash(&engine).await;

    // Any insert into transactions now fails at the storage layer.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE TRIGGER reject_tx BEFORE INSERT ON transactions \
         BEGIN SELECT RAISE(ABORT, 'rejected'); END",
    ))
    .await
    .unwrap();

    let err = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Borrow, "Dave", 1_000, Currency::Myr, march(1))
                .originate_from(wallet),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DependencyWriteFailure(_)));
    assert!(
        engine
            .list_loans(&LoanListFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn repayment_currency_must_match_loan() {
    let (engine, _db) = engine_with_db().await;
    let sgd = engine.new_wallet("Singapore", Currency::Sgd).await.unwrap();
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Eve",
            1_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            NewTransactionCmd::new(TransactionKind::Income, 500, sgd.id, at(2)).loan(loan.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(engine.loan(loan.id).await.unwrap().paid_amount_minor, 0);
}

#[tokio::test]
async fn repayment_of_the_wrong_kind_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let lent = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Lend, "Pia", 100_000, Currency::Myr, march(1))
                .originate_from(wallet),
        )
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            NewTransactionCmd::new(TransactionKind::Expense, 50_000, wallet, at(2))
                .loan(lent.id),
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("loan_id"));
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, -100_000);

    let expense = engine
        .create_transaction(NewTransactionCmd::new(
            TransactionKind::Expense,
            50_000,
            wallet,
            at(2),
        ))
        .await
        .unwrap();
    let err = engine
        .update_transaction(UpdateTransactionCmd::new(expense.id).loan(Some(lent.id)))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("loan_id"));
    assert_eq!(engine.transaction(expense.id).await.unwrap().loan, None);

    let borrowed = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Borrow,
            "Quin",
            20_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    let repayment = repay(&engine, TransactionKind::Income, 5_000, wallet, lent.id).await;
    let err = engine
        .update_transaction(UpdateTransactionCmd::new(repayment).loan(Some(borrowed.id)))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("loan_id"));

    let lent = engine.loan(lent.id).await.unwrap();
    assert_eq!(lent.paid_amount_minor, 5_000);
    assert_eq!(
        engine
            .loan_positions(Some(Currency::Myr))
            .await
            .unwrap()
            .total_receivable_minor,
        95_000
    );
    assert_eq!(engine.loan(borrowed.id).await.unwrap().paid_amount_minor, 0);
}

#[tokio::test]
async fn shrinking_a_repayment_reopens_a_settled_loan() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Borrow,
            "Rhea",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    let repayment = repay(&engine, TransactionKind::Expense, 10_000, wallet, loan.id).await;
    assert_eq!(
        engine.loan(loan.id).await.unwrap().status,
        LoanStatus::Settled
    );

    engine
        .update_transaction(UpdateTransactionCmd::new(repayment).amount_minor(7_000))
        .await
        .unwrap();
    let loan = engine.loan(loan.id).await.unwrap();
    assert_eq!(loan.paid_amount_minor, 7_000);
    assert_eq!(loan.status, LoanStatus::Active);
    assert_eq!(loan.remaining_minor(), 3_000);
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, -7_000);
}

#[tokio::test]
async fn linking_to_unknown_loan_fails() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;

    let err = engine
        .create_transaction(
            NewTransactionCmd::new(TransactionKind::Income, 500, wallet, at(2))
                .loan(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn deleting_a_loan_keeps_its_transactions() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Lend, "Frank", 30_000, Currency::Myr, march(1))
                .originate_from(wallet),
        )
        .await
        .unwrap();
    let repayment = repay(&engine, TransactionKind::Income, 10_000, wallet, loan.id).await;

    let unlinked = engine.delete_loan(loan.id).await.unwrap();
    assert_eq!(unlinked, 2);
    assert!(matches!(
        engine.loan(loan.id).await,
        Err(EngineError::KeyNotFound(_))
    ));

    let tx = engine.transaction(repayment).await.unwrap();
    assert_eq!(tx.loan, None);
    assert_eq!(tx.amount_minor, 10_000);
    assert_eq!(engine.wallet(wallet).await.unwrap().balance_minor, -20_000);

    assert!(matches!(
        engine.delete_loan(loan.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_repayment_reopens_a_settled_loan() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Gina",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    let repayment = repay(&engine, TransactionKind::Income, 10_000, wallet, loan.id).await;
    assert_eq!(
        engine.loan(loan.id).await.unwrap().status,
        LoanStatus::Settled
    );

    engine.delete_transaction(repayment).await.unwrap();
    let loan = engine.loan(loan.id).await.unwrap();
    assert_eq!(loan.paid_amount_minor, 0);
    assert_eq!(loan.status, LoanStatus::Active);
}

#[tokio::test]
async fn relinking_a_repayment_reconciles_both_loans() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let first = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Hana",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    let second = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Ivan",
            10_000,
            Currency::Myr,
            march(2),
        ))
        .await
        .unwrap();
    let repayment = repay(&engine, TransactionKind::Income, 4_000, wallet, first.id).await;

    engine
        .update_transaction(UpdateTransactionCmd::new(repayment).loan(Some(second.id)))
        .await
        .unwrap();
    assert_eq!(engine.loan(first.id).await.unwrap().paid_amount_minor, 0);
    assert_eq!(engine.loan(second.id).await.unwrap().paid_amount_minor, 4_000);

    engine
        .update_transaction(UpdateTransactionCmd::new(repayment).loan(None))
        .await
        .unwrap();
    assert_eq!(engine.loan(second.id).await.unwrap().paid_amount_minor, 0);
}

#[tokio::test]
async fn origination_cannot_be_relinked() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(
            NewLoanCmd::new(LoanKind::Borrow, "Jon", 10_000, Currency::Myr, march(1))
                .originate_from(wallet),
        )
        .await
        .unwrap();
    let (txs, _) = engine
        .list_transactions_page(
            &TransactionListFilter {
                loan_id: Some(loan.id),
                ..Default::default()
            },
            10,
            None,
        )
        .await
        .unwrap();

    let err = engine
        .update_transaction(UpdateTransactionCmd::new(txs[0].id).loan(None))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("loan_id"));
}

#[tokio::test]
async fn reconcile_is_idempotent_and_repairs_drift() {
    let (engine, db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let loan = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Borrow,
            "Kim",
            8_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    repay(&engine, TransactionKind::Expense, 3_000, wallet, loan.id).await;

    let once = engine.reconcile_loan(loan.id).await.unwrap();
    let twice = engine.reconcile_loan(loan.id).await.unwrap();
    assert_eq!(once, twice);
    assert_eq!(engine.reconcile_all_loans().await.unwrap(), 0);

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE loans SET paid_amount_minor = ? WHERE id = ?",
        vec![7_777i64.into(), loan.id.to_string().into()],
    ))
    .await
    .unwrap();
    assert_eq!(engine.reconcile_all_loans().await.unwrap(), 1);
    assert_eq!(engine.loan(loan.id).await.unwrap().paid_amount_minor, 3_000);

    assert!(matches!(
        engine.reconcile_loan(Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn positions_follow_outstanding_amounts() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;

    let lent = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Lia",
            10_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    repay(&engine, TransactionKind::Income, 2_500, wallet, lent.id).await;

    let written_off = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Max",
            5_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    engine
        .update_loan(UpdateLoanCmd::new(written_off.id).status(LoanStatus::BadDebt))
        .await
        .unwrap();

    engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Borrow,
            "Nia",
            3_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Borrow,
            "Oscar",
            9_900,
            Currency::Usd,
            march(1),
        ))
        .await
        .unwrap();

    let myr = engine.loan_positions(Some(Currency::Myr)).await.unwrap();
    assert_eq!(myr.total_receivable_minor, 7_500);
    assert_eq!(myr.total_payable_minor, 3_000);
    assert_eq!(myr.net_position_minor, 4_500);
    assert_eq!(myr.loan_count, 3);
    assert_eq!(myr.integrity_warnings, 0);

    let all = engine.loan_positions(None).await.unwrap();
    assert_eq!(all.loan_count, 4);
    assert_eq!(all.total_payable_minor, 12_900);
}

#[tokio::test]
async fn list_loans_filters_by_status_and_kind() {
    let (engine, _db) = engine_with_db().await;
    let wallet = cash(&engine).await;
    let settled = engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Lend,
            "Pia",
            1_000,
            Currency::Myr,
            march(1),
        ))
        .await
        .unwrap();
    repay(&engine, TransactionKind::Income, 1_000, wallet, settled.id).await;
    engine
        .create_loan(NewLoanCmd::new(
            LoanKind::Borrow,
            "Quin",
            1_000,
            Currency::Myr,
            march(3),
        ))
        .await
        .unwrap();

    let active = engine
        .list_loans(&LoanListFilter {
            status: Some(LoanStatus::Active),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].person, "Quin");

    let lends = engine
        .list_loans(&LoanListFilter {
            kind: Some(LoanKind::Lend),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(lends.len(), 1);
    assert_eq!(lends[0].status, LoanStatus::Settled);

    let all = engine.list_loans(&LoanListFilter::default()).await.unwrap();
    assert_eq!(all[0].person, "Quin");
}
