#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use authgate::app::build_router;
use authgate::config::{AppEnv, Config, JwtSecret};
use authgate::repos::InMemoryUserRepo;
use authgate::services::auth::TokenCodec;
use authgate::state::AppState;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub tokens: Arc<TokenCodec>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        jwt_secret: JwtSecret::new(SECRET).unwrap(),
        jwt_ttl_seconds: 3600,
        bcrypt_cost: 4,
        database_url: None,
        request_timeout_seconds: 30,
        request_body_limit_bytes: 1024 * 1024,
    }
}

pub fn app() -> TestApp {
    let config = config();
    let tokens = Arc::new(TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.jwt_ttl_seconds,
    ));
    let state = AppState::new(
        Arc::new(InMemoryUserRepo::new()),
        tokens.clone(),
        config.bcrypt_cost,
    )
    .unwrap();

    TestApp {
        router: build_router(state, &config),
        tokens,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn signup(&self, username: &str, roles: &[&str]) -> TestResponse {
        self.send(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(serde_json::json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": format!("pw-{username}"),
                "roles": roles,
            })),
        )
        .await
    }

    /// Sign up and log in; returns the bearer token.
    pub async fn login_as(&self, username: &str, roles: &[&str]) -> String {
        let res = self.signup(username, roles).await;
        assert_eq!(res.status, StatusCode::CREATED, "signup {username}: {:?}", res.body);

        let res = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "password": format!("pw-{username}"),
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "login {username}: {:?}", res.body);

        res.body["token"].as_str().unwrap().to_string()
    }
}
