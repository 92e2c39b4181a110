use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Currency, Decimal, Engine, TypeSet};
use migration::MigratorTrait;
use server::{AuthUser, RateError, RateProvider, RateTable, ServerState, StaticIdentity, router};

struct FixedRates;

#[async_trait::async_trait]
impl RateProvider for FixedRates {
    async fn latest(&self, base: Currency) -> Result<RateTable, RateError> {
        if base == Currency::Huf {
            return Err(RateError::Unavailable("connection refused".to_string()));
        }
        Ok(RateTable {
            base,
            fetched_at: Utc::now(),
            rates: BTreeMap::from([("USD".to_string(), Decimal::new(108, 2))]),
        })
    }
}

async fn identity() -> Arc<StaticIdentity> {
    let identity = StaticIdentity::new();
    for (token, id) in [("alice-token", "alice"), ("bob-token", "bob")] {
        identity
            .insert_token(
                token,
                AuthUser {
                    id: id.to_string(),
                    email: Some(format!("{id}@example.com")),
                },
            )
            .await;
    }
    Arc::new(identity)
}

async fn state_with(engine: Engine, with_identity: bool) -> ServerState {
    let identity: Option<Arc<dyn server::IdentityProvider>> = if with_identity {
        Some(identity().await)
    } else {
        None
    };
    ServerState {
        engine: Arc::new(engine),
        identity,
        rates: Arc::new(FixedRates),
        types: Arc::new(TypeSet::default()),
    }
}

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    router(state_with(engine, true).await)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let authorization = token.map(|token| format!("Bearer {token}"));
    send_authorized(app, method, uri, authorization.as_deref(), body).await
}

/// Like `send`, with the raw `Authorization` header value.
async fn send_authorized(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let res = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn water_entry() -> Value {
    json!({
        "type": "water",
        "usage_amount": 12,
        "unit_price": 2.5,
        "unit": "m³",
        "date": "2024-03-15"
    })
}

#[tokio::test]
async fn health_needs_no_credential() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "connected"}));
}

#[tokio::test]
async fn missing_or_unknown_token_is_401() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/entries", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing or invalid authorization header");

    let (status, body) = send(&app, "GET", "/entries", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    for value in ["Basic YWxpY2U6c2VjcmV0", "Token abc", "Bearer", "Bearer "] {
        let (status, body) = send_authorized(&app, "GET", "/entries", Some(value), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{value}");
        assert_eq!(body["error"], "Missing or invalid authorization header");
    }
}

#[tokio::test]
async fn unconfigured_identity_is_503() {
    let engine = Engine::builder().build().await.unwrap();
    let app = router(state_with(engine, false).await);
    let (status, _) = send(&app, "GET", "/entries", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "a@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unconfigured_store_is_503() {
    let engine = Engine::builder().build().await.unwrap();
    let app = router(state_with(engine, true).await);

    let (status, body) = send(&app, "GET", "/entries/stats", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Database unavailable");

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "not configured");

    // validation still runs first
    let (status, _) = send(&app, "POST", "/entries", Some("alice-token"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_list_and_stats() {
    let app = app().await;
    let (status, created) =
        send(&app, "POST", "/entries", Some("alice-token"), Some(water_entry())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "water");
    assert_eq!(created["cost_amount"], json!(30.0));
    assert_eq!(created["owner_id"], "alice");
    assert_eq!(created["date"], "2024-03-15");

    let (status, listed) = send(&app, "GET", "/entries", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));

    let (_, others) = send(&app, "GET", "/entries", Some("bob-token"), None).await;
    assert_eq!(others, json!([]));

    let (status, stats) = send(&app, "GET", "/entries/stats", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totals"]["entry_count"], 1);
    assert_eq!(stats["totals"]["total_cost"], json!(30.0));
    assert_eq!(stats["byType"][0]["type"], "water");
    assert_eq!(stats["monthly"][0]["month"], "2024-03");

    let (_, price) = send(&app, "GET", "/settings/water", Some("alice-token"), None).await;
    assert_eq!(price, json!({"unit_price": 2.5}));
}

#[tokio::test]
async fn create_reports_first_failing_field() {
    let app = app().await;
    let mut body = water_entry();
    body["usage_amount"] = json!(-1);
    body["unit"] = json!("  ");

    let (status, res) = send(&app, "POST", "/entries", Some("alice-token"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "usage_amount must be a non-negative number");

    let mut body = water_entry();
    body["date"] = json!("2023-02-30");
    let (status, res) = send(&app, "POST", "/entries", Some("alice-token"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "date must be a valid date in YYYY-MM-DD format");
}

#[tokio::test]
async fn list_rejects_inverted_range() {
    let app = app().await;
    let (status, res) = send(
        &app,
        "GET",
        "/entries?from=2024-03-01&to=2024-02-01",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "from must not be after to");
}

#[tokio::test]
async fn delete_is_owner_scoped() {
    let app = app().await;
    let (_, created) =
        send(&app, "POST", "/entries", Some("alice-token"), Some(water_entry())).await;
    let uri = format!("/entries/{}", created["id"].as_str().unwrap());

    let (status, res) = send(&app, "DELETE", &uri, Some("bob-token"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(res["error"], "Entry not found");

    let (status, res) = send(&app, "DELETE", &uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, json!({"message": "Entry deleted"}));

    let (status, _) = send(&app, "DELETE", &uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, res) =
        send(&app, "DELETE", "/entries/not-a-uuid", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Entry ID must be a valid UUID");
}

#[tokio::test]
async fn breakdown_validates_and_groups() {
    let app = app().await;
    for (day, cost) in [("2024-01-05", 10), ("2024-01-20", 15)] {
        let body = json!({
            "type": "fuel",
            "usage_amount": 20,
            "cost_amount": cost,
            "unit": "L",
            "date": day
        });
        let (status, _) = send(&app, "POST", "/entries", Some("alice-token"), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, res) = send(
        &app,
        "GET",
        "/entries/breakdown/fuel?year=2024",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        res,
        json!({"monthly": [{"month": "2024-01", "total": 25.0}], "daily": []})
    );

    let (status, res) = send(
        &app,
        "GET",
        "/entries/breakdown/fuel?year=2024&month=13",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "month must be a number between 1 and 12");

    let (status, _) = send(
        &app,
        "GET",
        "/entries/breakdown/gas?year=2024",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_and_preferences_round_trip() {
    let app = app().await;
    let (_, res) = send(&app, "GET", "/settings/electricity", Some("alice-token"), None).await;
    assert_eq!(res, json!({"unit_price": null}));

    let (status, res) = send(
        &app,
        "PUT",
        "/settings/electricity",
        Some("alice-token"),
        Some(json!({"unit_price": 0.35})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["type"], "electricity");
    assert_eq!(res["unit_price"], json!(0.35));

    let (status, _) = send(
        &app,
        "PUT",
        "/settings/electricity",
        Some("alice-token"),
        Some(json!({"unit_price": "cheap"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, res) = send(&app, "GET", "/preferences/currency", Some("alice-token"), None).await;
    assert_eq!(res, json!({"currency": "EUR"}));

    let (status, res) = send(
        &app,
        "PUT",
        "/preferences/currency",
        Some("alice-token"),
        Some(json!({"currency": "GBP"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["currency"], "GBP");

    let (status, _) = send(
        &app,
        "PUT",
        "/preferences/currency",
        Some("alice-token"),
        Some(json!({"currency": "BTC"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = app().await;
    let (status, res) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": " New@Example.com", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Password must be at least 6 characters");

    let credentials = json!({"email": " New@Example.com", "password": "secret1"});
    let (status, session) =
        send(&app, "POST", "/auth/register", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["user"]["email"], "new@example.com");

    let (status, _) = send(&app, "POST", "/auth/register", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, login) = send(&app, "POST", "/auth/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"], session["user"]);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "new@example.com", "password": "wrong12"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rates_come_from_provider() {
    let app = app().await;
    let (status, res) = send(&app, "GET", "/rates", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["base"], "EUR");
    assert_eq!(res["rates"]["USD"], json!(1.08));

    let (status, res) = send(&app, "GET", "/rates?base=HUF", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res["error"], "Exchange rates unavailable");
}

#[tokio::test]
async fn convert_uses_latest_table() {
    let app = app().await;
    let (status, res) = send(
        &app,
        "GET",
        "/rates/convert?amount=12.345&to=USD",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["from"], "EUR");
    assert_eq!(res["to"], "USD");
    assert_eq!(res["amount"], json!(12.345));
    assert_eq!(res["converted"], json!(13.33));

    let uri = "/rates/convert?amount=10&from=EUR&to=EUR";
    let (status, res) = send(&app, "GET", uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["converted"], json!(10.0));

    let uri = "/rates/convert?amount=10&to=GBP";
    let (status, res) = send(&app, "GET", uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "No exchange rate for GBP");

    let uri = "/rates/convert?amount=-1&to=USD";
    let (status, res) = send(&app, "GET", uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "amount must be a non-negative number");

    let uri = "/rates/convert?amount=10&from=HUF&to=USD";
    let (status, _) = send(&app, "GET", uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(&app, "GET", "/rates/convert?amount=10&to=USD", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn spawned_server_answers_over_tcp() {
    let engine = Engine::builder().build().await.unwrap();
    let state = state_with(engine, true).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server::spawn_with_listener(state, listener).unwrap();

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok", "database": "not configured"}));
}
