pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use service_core::axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, patch, post},
    BoxError, Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
    REQUEST_ID_HEADER,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AuthConfig;
use crate::middleware::RequiredAdminService;
use crate::models::Specification;
use crate::services::{AuthService, CredentialStore, JwtService, RegistrationService};

/// Admin service that guards cross-user lookups.
pub const USERS_ADMIN_SERVICE: &str = "users";

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn CredentialStore>,
    pub jwt: JwtService,
    pub registration: RegistrationService,
    pub auth_service: AuthService,
}

impl AppState {
    /// Wire services over `store`. The signing secret goes straight from
    /// config into the token codec.
    pub fn new(config: AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self, AppError> {
        let default_specification: Specification = config
            .registration
            .default_specification
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let token_expiry = chrono::Duration::try_days(config.jwt.token_expiry_days).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("JWT_TOKEN_EXPIRY_DAYS is out of range"))
        })?;
        let jwt = JwtService::new(&config.jwt.secret, token_expiry);
        let registration = RegistrationService::new(
            store.clone(),
            config.registration.default_role_name.clone(),
            default_specification,
        );
        let auth_service = AuthService::new(store.clone(), jwt.clone());

        Ok(Self {
            config,
            store,
            jwt,
            registration,
            auth_service,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let admin_routes = Router::new()
        .route("/users/:user_id", get(handlers::get_user_by_id))
        .route_layer(from_fn_with_state(
            RequiredAdminService(USERS_ADMIN_SERVICE),
            middleware::require_admin_service,
        ));

    // Route layers leave the fallback alone, so unknown paths still 404.
    // Token verification runs before the capability guard.
    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me))
        .route("/update_user_info", patch(handlers::update_user_info))
        .route("/get_user_roles", get(handlers::get_user_roles))
        .route("/get_user_properties", get(handlers::get_user_properties))
        .merge(admin_routes)
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let request_timeout = state.config.common.request_timeout();

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(request_timeout),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Dropping the timed-out future also cancels any in-flight store query.
async fn handle_timeout_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        AppError::RequestTimeout
    } else {
        AppError::InternalError(anyhow::anyhow!("Unhandled middleware error: {}", err))
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, store) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "up"),
        Err(e) => {
            tracing::error!(error = %e, "Credential store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": if status == StatusCode::OK { "healthy" } else { "unhealthy" },
            "service": state.config.service_name,
            "version": state.config.service_version,
            "checks": { "store": store },
        })),
    )
}
