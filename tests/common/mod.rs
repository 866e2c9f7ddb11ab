#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Form, Json, Router,
    body::{Body, to_bytes},
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use auditdesk::{
    config::AppConfig,
    models::{UserRecord, UserRole},
    routes,
    session::login_cookies,
    state::init_state,
};

pub const ADMIN_TOKEN: &str = "token-admin";
pub const STAFF_TOKEN: &str = "token-staff";

/// Calls the fake API received: every mutating endpoint, plus work reads.
#[derive(Default)]
pub struct Calls {
    pub work_reads: AtomicUsize,
    pub finalize: AtomicUsize,
    pub map_entry: AtomicUsize,
    pub upload: AtomicUsize,
    pub report_config_saves: AtomicUsize,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct TestApp {
    pub app: Router,
    pub calls: Arc<Calls>,
}

#[derive(Deserialize)]
struct MapBody {
    trial_balance_entry_id: i64,
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

fn authorized(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ADMIN_TOKEN}") || v == format!("Bearer {STAFF_TOKEN}"))
}

fn work_json() -> Value {
    json!({
        "id": 12,
        "company_id": 3,
        "start_date": "2024-04-01",
        "end_date": "2025-03-31",
        "status": "active",
        "units": [
            {"id": 1, "unit_name": "Mumbai"},
            {"id": 2, "unit_name": "Delhi"}
        ]
    })
}

/// Work 13 was signed off and can no longer change.
fn finalized_work_json() -> Value {
    json!({
        "id": 13,
        "company_id": 3,
        "start_date": "2023-04-01",
        "end_date": "2024-03-31",
        "status": "finalized",
        "udin": "23123456ABCDEF1234",
        "signing_date": "2024-06-15",
        "units": [{"id": 1, "unit_name": "Mumbai"}]
    })
}

fn upstream(calls: Arc<Calls>) -> Router {
    Router::new()
        .route(
            "/auth/login",
            post(|Form(body): Form<LoginBody>| async move {
                match (body.username.as_str(), body.password.as_str()) {
                    ("admin", "pw") => Json(json!({"access_token": ADMIN_TOKEN, "user_id": 1, "role": "ADMIN"}))
                        .into_response(),
                    ("staff", "pw") => Json(json!({"access_token": STAFF_TOKEN, "user_id": 2, "role": "STAFF"}))
                        .into_response(),
                    _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "bad credentials"}))).into_response(),
                }
            }),
        )
        .route(
            "/companies/",
            get(|| async { Json(json!([{"id": 3, "legal_name": "Acme Traders Pvt Ltd", "client_type": "COMPANY"}])) }),
        )
        .route(
            "/companies/{id}",
            get(|Path(id): Path<i64>| async move {
                if id == 3 {
                    Json(json!({"id": 3, "legal_name": "Acme Traders Pvt Ltd", "client_type": "COMPANY", "pan": "AAACA1234A"}))
                        .into_response()
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"detail": "company not found"}))).into_response()
                }
            }),
        )
        .route("/works/", get(|| async { Json(json!([work_json()])) }))
        .route(
            "/works/{id}",
            get({
                let calls = calls.clone();
                move |Path(id): Path<i64>, headers: axum::http::HeaderMap| async move {
                    calls.work_reads.fetch_add(1, Ordering::SeqCst);
                    if !authorized(&headers) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    match id {
                        12 => Json(work_json()).into_response(),
                        13 => Json(finalized_work_json()).into_response(),
                        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "work not found"}))).into_response(),
                    }
                }
            }),
        )
        .route(
            "/works/{id}/unmapped-entries",
            get(|| async {
                Json(json!([
                    {"id": 101, "account_name": "HDFC Current Account", "debit": 250000.0, "credit": 0.0, "closing_balance": 250000.0, "unit_id": 1},
                    {"id": 102, "account_name": "Office Rent", "debit": 60000.0, "credit": 0.0, "closing_balance": 60000.0, "unit_id": 2}
                ]))
            }),
        )
        .route(
            "/accounts/",
            get(|| async {
                Json(json!([
                    {"id": 1, "name": "Assets", "type": "CATEGORY", "category_type": "ASSET"},
                    {"id": 10, "name": "Cash and Cash Equivalents", "type": "HEAD", "category_type": "ASSET", "parent_id": 1},
                    {"id": 11, "name": "Balances with Banks", "type": "SUB_HEAD", "category_type": "ASSET", "parent_id": 10}
                ]))
            }),
        )
        .route(
            "/templates/",
            get(|| async {
                Json(json!([
                    {"id": 7, "name": "Schedule III Balance Sheet", "statement_type": "BALANCE_SHEET",
                     "template_definition": [], "applicable_client_types": ["COMPANY"]},
                    {"id": 8, "name": "LLP Balance Sheet", "statement_type": "BALANCE_SHEET",
                     "template_definition": [], "applicable_client_types": ["LLP"]}
                ]))
            }),
        )
        .route(
            "/works/{id}/validation-stats",
            get(|| async {
                Json(json!({"total_entries": 2, "mapped_entries": 0, "unmapped_entries": 2,
                            "total_debit": 310000.0, "total_credit": 310000.0}))
            }),
        )
        .route("/compliance/templates", get(|| async { Json(json!([])) }))
        .route(
            "/works/{id}/units/{unit_id}/versions",
            get({
                let calls = calls.clone();
                // Mumbai has one upload on record; Delhi gets its first with the upload endpoint.
                move |Path((_, unit_id)): Path<(i64, i64)>| async move {
                    let delhi_uploaded = Calls::count(&calls.upload) > 0;
                    if unit_id == 1 || (unit_id == 2 && delhi_uploaded) {
                        Json(json!([{"version": 1, "row_count": 42}]))
                    } else {
                        Json(json!([]))
                    }
                }
            }),
        )
        .route(
            "/works/{id}/map-entry",
            post({
                let calls = calls.clone();
                // Slow enough that two submissions overlap; entry 101 is always refused.
                move |Json(body): Json<MapBody>| async move {
                    calls.map_entry.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                    if body.trial_balance_entry_id == 101 {
                        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": "mapping rejected"}))).into_response()
                    } else {
                        Json(json!({"status": "mapped"})).into_response()
                    }
                }
            }),
        )
        .route(
            "/works/{id}/finalize",
            post({
                let calls = calls.clone();
                move || async move {
                    calls.finalize.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"status": "finalized"}))
                }
            }),
        )
        .route(
            "/works/{id}/units/{unit_id}/trial-balance",
            post({
                let calls = calls.clone();
                move || async move {
                    calls.upload.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"rows": 42}))
                }
            }),
        )
        .route(
            "/works/{id}/preview/{template_id}",
            get(|| async {
                Json(json!({
                    "template_definition": [
                        {"type": "header_block", "text": "BALANCE SHEET"},
                        {"type": "title", "text": "Current Assets"},
                        {"type": "financial_line_item", "label": "Cash and Bank", "account_head_id": 10, "note_ref": "3"},
                        {"type": "financial_line_item", "label": "Inventories", "account_head_id": 20},
                        {"type": "subtotal", "label": "Total Current Assets", "id": 900}
                    ],
                    "balances": {"10": {"current": 1234567.5, "previous": 1000.0}, "900": 1234567.5},
                    "notes": [{"note_ref": "3", "title": "Cash and Bank", "children": [{"name": "HDFC", "current": 1234567.5, "previous": 1000.0}]}]
                }))
            }),
        )
        .route(
            "/reports/{id}/config",
            get(|| async { Json(json!({"custom_notes": {"3": "Balances confirmed with bank statements."}})) }).post({
                let calls = calls.clone();
                move || async move {
                    calls.report_config_saves.fetch_add(1, Ordering::SeqCst);
                    Json(json!({}))
                }
            }),
        )
        .route(
            "/auth/users",
            get(|| async { Json(json!([{"id": 2, "username": "staff", "role": "STAFF", "assigned_companies": []}])) }),
        )
}

/// Starts the fake accounting API on a free port and builds the app against it.
pub async fn spawn_app() -> TestApp {
    let calls = Arc::new(Calls::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake api");
    let addr = listener.local_addr().expect("fake api addr");
    let api = upstream(calls.clone());
    tokio::spawn(async move {
        axum::serve(listener, api).await.expect("fake api server");
    });

    let config = AppConfig::for_api(format!("http://{addr}"));
    let state = init_state(config).expect("state");
    TestApp {
        app: routes::app(Arc::new(state)),
        calls,
    }
}

/// `Cookie` header value for a signed-in user.
pub fn session_cookie(token: &str, username: &str, role: UserRole) -> String {
    let user = UserRecord {
        user_id: if role.is_admin() { 1 } else { 2 },
        sub: username.to_string(),
        role,
    };
    login_cookies(token, &user, 3600)
        .iter()
        .filter_map(|c| c.to_str().ok())
        .filter_map(|c| c.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn admin_cookie() -> String {
    session_cookie(ADMIN_TOKEN, "admin", UserRole::Admin)
}

pub fn staff_cookie() -> String {
    session_cookie(STAFF_TOKEN, "staff", UserRole::Staff)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<HeaderValue>, String) {
    let response: Response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let location = response.headers().get(header::LOCATION).cloned();
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, location, String::from_utf8_lossy(&body).into_owned())
}

pub fn get_as(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

pub fn form_as(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub const BOUNDARY: &str = "auditdesk-test-boundary";

/// Multipart body with text fields and an optional `file` part.
pub fn multipart_as(uri: &str, cookie: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("request")
}
