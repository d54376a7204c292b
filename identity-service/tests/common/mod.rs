//! Shared setup for identity-service integration tests.
//!
//! Every test gets its own in-memory credential store and signing secret, so
//! tests never share state and need no external services.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use identity_service::{
    build_router,
    config::{
        AuthConfig, DatabaseConfig, Environment, JwtConfig, RegistrationConfig, SecurityConfig,
    },
    services::{CredentialStore, InMemoryCredentialStore},
    AppState,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config(secret: &str) -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config {
            port: 8080,
            request_timeout_seconds: 5,
        },
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: Secret::new("postgres://unused".to_string()),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_seconds: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new(secret.to_string()),
            token_expiry_days: 30,
        },
        registration: RegistrationConfig {
            default_role_name: "User".to_string(),
            default_specification: "Frontend".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://allowed.com".to_string()],
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryCredentialStore>,
    pub secret: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// App over a store seeded with the `User` and `Admin` roles.
    pub fn spawn() -> Self {
        Self::with_store(InMemoryCredentialStore::with_roles(&["User", "Admin"]))
    }

    pub fn with_store(store: InMemoryCredentialStore) -> Self {
        let secret = format!("test-secret-{}", Uuid::new_v4());
        let store = Arc::new(store);
        let state = AppState::new(test_config(&secret), store.clone())
            .expect("test config is valid");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            secret,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
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
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let authorization = token.map(|t| format!("Bearer {}", t));
        self.request(Method::GET, uri, None, authorization.as_deref())
            .await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/register",
            Some(json!({ "name": name, "email": email, "password": password })),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Register then log in, returning `(user_id, access_token)`.
    pub async fn signed_in(&self, email: &str) -> (Uuid, String) {
        let registered = self.register("Test User", email, TEST_PASSWORD).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
        let user_id = registered.body["user"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap();

        let login = self.login(email, TEST_PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        let token = login.body["access_token"].as_str().unwrap().to_string();

        (user_id, token)
    }

    /// Grant `admin_<service>` to the user through a fresh role.
    pub async fn grant_admin_service(&self, user_id: Uuid, service: &str) {
        let role = self.store.add_role(&format!("{} admins", service));
        let permission = self.store.add_permission(&format!("admin_{}", service));
        self.store.grant(role.id, permission.id);
        self.store
            .save_user_role(&identity_service::models::UserRole::new(user_id, role.id))
            .await
            .unwrap();
    }
}
