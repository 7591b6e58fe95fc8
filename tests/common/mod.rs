#![allow(dead_code)]

use budget_backend::clock::FixedClock;
use budget_backend::config::AppConfig;
use budget_backend::mailer::MemoryMailer;
use budget_backend::store::MemoryStore;
use budget_backend::FinanceApp;
use chrono::NaiveDate;
use rocket::http::{ContentType, Header, Method, Status};
use rocket::local::blocking::Client;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TODAY: &str = "2024-03-10";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub client: Client,
    pub mailer: Arc<MemoryMailer>,
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn test_config() -> AppConfig {
    AppConfig {
        admin_emails: vec!["admin@example.com".to_string()],
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

pub fn test_app_with(config: AppConfig) -> TestApp {
    let mailer = Arc::new(MemoryMailer::new());
    let app = FinanceApp::new(
        Arc::new(MemoryStore::new()),
        mailer.clone(),
        Arc::new(FixedClock::new(date(TODAY))),
        config,
    );
    let client = Client::untracked(budget_backend::rocket_with(app)).expect("valid rocket instance");
    TestApp { client, mailer }
}

pub fn test_app() -> TestApp {
    test_app_with(test_config())
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

/// Dispatches a request and returns the status with the JSON body (`Null` when empty).
pub fn call(
    client: &Client,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (Status, Value) {
    let mut request = client.req(method, uri);
    if let Some(token) = token {
        request = request.header(bearer(token));
    }
    if let Some(body) = body {
        request = request.header(ContentType::JSON).body(body.to_string());
    }
    let response = request.dispatch();
    let status = response.status();
    let json = response.into_json::<Value>().unwrap_or(Value::Null);
    (status, json)
}

pub fn get(client: &Client, uri: &str, token: &str) -> (Status, Value) {
    call(client, Method::Get, uri, Some(token), None)
}

pub fn post(client: &Client, uri: &str, token: &str, body: Value) -> (Status, Value) {
    call(client, Method::Post, uri, Some(token), Some(body))
}

pub fn put(client: &Client, uri: &str, token: &str, body: Value) -> (Status, Value) {
    call(client, Method::Put, uri, Some(token), Some(body))
}

pub fn delete(client: &Client, uri: &str, token: &str) -> (Status, Value) {
    call(client, Method::Delete, uri, Some(token), None)
}

pub fn register(client: &Client, username: &str) -> Value {
    let (status, body) = call(
        client,
        Method::Post,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": PASSWORD,
        })),
    );
    assert_eq!(status, Status::Ok, "registration failed: {}", body);
    body
}

pub fn login(client: &Client, username: &str) -> String {
    let (status, body) = call(
        client,
        Method::Post,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": PASSWORD })),
    );
    assert_eq!(status, Status::Ok, "login failed: {}", body);
    body["session_token"].as_str().unwrap().to_string()
}

/// Registers and logs in; returns `(user_id, session_token)`.
pub fn signup(client: &Client, username: &str) -> (String, String) {
    let user = register(client, username);
    let token = login(client, username);
    (user["id"].as_str().unwrap().to_string(), token)
}

/// Creates a budget account owned by `token`'s user and returns its id.
pub fn create_account(client: &Client, token: &str, name: &str) -> String {
    let (status, body) = post(client, "/api/accounts", token, json!({ "name": name }));
    assert_eq!(status, Status::Ok, "account creation failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

pub fn webhook(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .header(Header::new("X-Webhook-Secret", WEBHOOK_SECRET))
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}
