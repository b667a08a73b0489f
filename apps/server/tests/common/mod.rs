#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use catalog_server::{api::app_router, build_state, config::Config};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const API_TOKEN: &str = "test-api-token";

/// Router over a fresh database. The directory lives as long as the app.
pub struct TestApp {
    pub router: Router,
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn spawn_app(extra: &[(&str, &str)]) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");

    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "CATALOG_DB_PATH".to_string(),
            db_path.to_str().unwrap().to_string(),
        ),
        ("CATALOG_LOCALES".to_string(), "en_US,nl_NL".to_string()),
        ("CATALOG_API_TOKENS".to_string(), API_TOKEN.to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let state = build_state(&config).await.unwrap();
    TestApp {
        router: app_router(state, &config),
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Authenticated request with an optional JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send(method, uri, Some(API_TOKEN), body.map(|b| b.to_string()))
            .await
    }

    /// Creates a taxon with an `en_US` translation and returns its id.
    pub async fn create_taxon(&self, code: &str, parent: Option<&str>) -> i64 {
        let mut body = serde_json::json!({
            "code": code,
            "translations": {
                "en_US": {"name": code, "slug": code}
            }
        });
        if let Some(parent) = parent {
            body["parent"] = Value::from(parent);
        }
        let response = self.call(Method::POST, "/api/v1/taxons/", Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()["id"].as_i64().unwrap()
    }
}
