//! In-process test harness: full router over a seeded in-memory store

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use hr_server::db::{MemoryStore, seed};
use hr_server::{AppState, Config, build_app};

pub const ADMIN: (&str, &str) = ("admin@example.com", "admin123");
pub const HR: (&str, &str) = ("hr@example.com", "hrmanager123");
pub const MANAGER: (&str, &str) = ("manager@example.com", "manager123");
pub const EMPLOYEE: (&str, &str) = ("employee@example.com", "employee123");

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

/// Raw response: status, body bytes, parsed JSON (Null when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub bytes: Vec<u8>,
    pub json: Value,
}

impl TestResponse {
    pub fn code(&self) -> Option<u64> {
        self.json["code"].as_u64()
    }

    pub fn data(&self) -> &Value {
        &self.json["data"]
    }
}

pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    seed::bootstrap(store.as_ref(), true, 0)
        .await
        .expect("seed demo data");
    let state = AppState::with_store(Config::development(), store);
    TestApp {
        app: build_app(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes()
            .to_vec();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            bytes,
            json,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login_raw(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Access token and user id of a demo account
    pub async fn login(&self, account: (&str, &str)) -> (String, String) {
        let res = self.login_raw(account.0, account.1).await;
        assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.json);
        let token = res.data()["accessToken"].as_str().expect("token").to_string();
        let id = res.data()["user"]["id"].as_str().expect("id").to_string();
        (token, id)
    }

    pub async fn leave_type_id(&self, token: &str, name: &str) -> String {
        let res = self.get("/api/leave/types", token).await;
        assert_eq!(res.status, StatusCode::OK);
        res.data()
            .as_array()
            .expect("types")
            .iter()
            .find(|t| t["name"] == name)
            .and_then(|t| t["id"].as_str())
            .expect("leave type seeded")
            .to_string()
    }

    pub async fn department_id(&self, token: &str, name: &str) -> String {
        let res = self.get("/api/departments", token).await;
        assert_eq!(res.status, StatusCode::OK);
        res.data()
            .as_array()
            .expect("departments")
            .iter()
            .find(|d| d["name"] == name)
            .and_then(|d| d["id"].as_str())
            .expect("department seeded")
            .to_string()
    }
}
