use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    router(ServerState {
        engine: Arc::new(engine),
    })
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn new_wallet(app: &Router, name: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/wallets",
        Some(json!({ "name": name, "currency": "MYR" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn lend_flow_over_http() {
    let app = app().await;
    let wallet = new_wallet(&app, "Cash").await;

    let (status, loan) = call(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "kind": "lend",
            "person": "Alice",
            "total_amount_minor": 100_000,
            "start_date": "2026-03-01",
            "wallet_id": wallet,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "active");
    assert_eq!(loan["paid_amount_minor"], 0);
    assert_eq!(loan["currency"], "MYR");
    let loan_id = loan["id"].as_str().unwrap().to_string();

    for amount in [40_000, 60_000] {
        let (status, tx) = call(
            &app,
            Method::POST,
            "/transactions",
            Some(json!({
                "kind": "income",
                "amount_minor": amount,
                "wallet_id": wallet,
                "loan_id": loan_id,
                "occurred_at": "2026-03-10T09:00:00+08:00",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx["loan_role"], "repayment");
    }

    let (status, loan) = call(&app, Method::GET, &format!("/loans/{loan_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loan["status"], "settled");
    assert_eq!(loan["remaining_minor"], 0);
    assert_eq!(loan["progress_percent"], 100);

    let (_, wallet_view) = call(&app, Method::GET, &format!("/wallets/{wallet}"), None).await;
    assert_eq!(wallet_view["balance_minor"], 0);

    let (status, list) = call(
        &app,
        Method::GET,
        &format!("/transactions?loan_id={loan_id}&limit=2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["transactions"].as_array().unwrap().len(), 2);
    assert!(list["next_cursor"].is_string());
}

#[tokio::test]
async fn invalid_loan_reports_the_field() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "kind": "borrow",
            "person": "Bob",
            "total_amount_minor": 0,
            "start_date": "2026-03-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "total_amount_minor");

    let (_, loans) = call(&app, Method::GET, "/loans", None).await;
    assert!(loans.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn settled_status_cannot_be_forced() {
    let app = app().await;
    let (_, loan) = call(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "kind": "lend",
            "person": "Carol",
            "total_amount_minor": 500,
            "start_date": "2026-03-01",
        })),
    )
    .await;
    let uri = format!("/loans/{}", loan["id"].as_str().unwrap());

    let (status, body) = call(&app, Method::PATCH, &uri, Some(json!({ "status": "settled" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "status");

    let (status, body) = call(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "status": "bad_debt", "due_date": "2026-04-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "bad_debt");
    assert_eq!(body["due_date"], "2026-04-01");

    let (status, body) = call(&app, Method::PATCH, &uri, Some(json!({ "due_date": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["due_date"].is_null());
    assert_eq!(body["status"], "bad_debt");
}

#[tokio::test]
async fn deleting_a_loan_unlinks_transactions() {
    let app = app().await;
    let wallet = new_wallet(&app, "Cash").await;
    let (_, loan) = call(
        &app,
        Method::POST,
        "/loans",
        Some(json!({
            "kind": "borrow",
            "person": "Dan",
            "total_amount_minor": 2_000,
            "start_date": "2026-03-01",
            "wallet_id": wallet,
        })),
    )
    .await;
    let loan_id = loan["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::DELETE, &format!("/loans/{loan_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlinked_transactions"], 1);

    let (status, _) = call(&app, Method::GET, &format!("/loans/{loan_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = call(&app, Method::GET, &format!("/transactions?wallet_id={wallet}"), None).await;
    let txs = list["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 1);
    assert!(txs[0]["loan_id"].is_null());
    assert_eq!(txs[0]["kind"], "income");
}

#[tokio::test]
async fn positions_by_currency() {
    let app = app().await;
    for (kind, person, total, currency) in [
        ("lend", "Eve", 3_000, "MYR"),
        ("borrow", "Fay", 1_000, "MYR"),
        ("lend", "Gus", 9_000, "USD"),
    ] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/loans",
            Some(json!({
                "kind": kind,
                "person": person,
                "total_amount_minor": total,
                "currency": currency,
                "start_date": "2026-03-01",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(&app, Method::GET, "/loans/positions?currency=MYR", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_receivable_minor"], 3_000);
    assert_eq!(body["total_payable_minor"], 1_000);
    assert_eq!(body["net_position_minor"], 2_000);
    assert_eq!(body["loan_count"], 2);
    assert_eq!(body["currency"], "MYR");
}

#[tokio::test]
async fn unknown_ids_and_bad_cursors() {
    let app = app().await;
    let missing = uuid::Uuid::new_v4();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/loans/{missing}/reconcile"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, &format!("/transactions/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/transactions?cursor=garbage", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_wallet_is_a_conflict() {
    let app = app().await;
    new_wallet(&app, "Cash").await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/wallets",
        Some(json!({ "name": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
