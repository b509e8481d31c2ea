#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use caterhub_api::{app, config::Config, db::Stores, services::sweep::SweepMode, AppState};

pub const ADMIN_EMAIL: &str = "owner@caterhub.test";
pub const PASSWORD: &str = "secret123";

pub fn test_config() -> Config {
    Config {
        database_url: "memory://".into(),
        jwt_secret: "test-secret".into(),
        jwt_expiry_seconds: 3600,
        bcrypt_cost: 4,
        host: "127.0.0.1".into(),
        port: 0,
        app_base_url: "http://localhost:5173".into(),
        admin_emails: vec![ADMIN_EMAIL.into()],
        sweep_mode: SweepMode::Off,
    }
}

pub fn test_state() -> AppState {
    AppState::new(Stores::in_memory(), Arc::new(test_config()))
}

pub fn test_app() -> Router {
    app(test_state())
}

/// Send one request through the router and decode the JSON body (Null when empty).
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Register an account and return its bearer token.
pub async fn register(app: &Router, username: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "firstName": "Asha",
            "lastName": "Rao",
            "email": email,
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

pub async fn admin_token(app: &Router) -> String {
    register(app, "owner", ADMIN_EMAIL).await
}

pub fn menu_body(date: NaiveDate, status: &str) -> Value {
    json!({
        "date": date,
        "mealType": "lunch",
        "menuItems": [
            { "name": "Dal tadka", "category": "main_course", "ingredients": ["toor dal", "ghee"] },
            { "name": "Jeera rice", "category": "rice" },
            { "name": "Gulab jamun", "category": "dessert" }
        ],
        "pricing": { "fullMeal": 120.0, "halfMeal": 80.0 },
        "availableQuantity": 40,
        "status": status,
        "tags": ["fresh", "fresh", " "]
    })
}
