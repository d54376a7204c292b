use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

use crate::{dtos::ErrorResponse, services::Principal, AppState};

type Rejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(error: &str, details: Option<String>) -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive. A bare token, a different scheme or any
/// extra segment is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Authorization header is required", None))?;

    let value = value
        .to_str()
        .map_err(|_| unauthorized("Invalid authorization header format", None))?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(unauthorized("Invalid authorization header format", None)),
    }
}

/// Verify the bearer token and attach the `Principal` to the request.
///
/// Stateless: nothing is read from the credential store.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, Rejection> {
    let token = bearer_token(req.headers())?;

    let principal = state.jwt.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        unauthorized("Invalid or expired token", Some(e.to_string()))
    })?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Extractor for the principal attached by `auth_middleware`.
pub struct AuthUser(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Principal missing from request extensions"
            ))
        })?;

        Ok(AuthUser(principal.clone()))
    }
}

/// Admin service a route group requires, e.g. `users` for `admin_users`.
#[derive(Debug, Clone)]
pub struct RequiredAdminService(pub &'static str);

/// Capability guard; layered inside `auth_middleware`.
pub async fn require_admin_service(
    State(required): State<RequiredAdminService>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req.extensions().get::<Principal>().ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!("Principal missing from request"))
    })?;

    if !principal.has_admin_service(required.0) {
        tracing::warn!(
            user_id = %principal.user_id,
            required_service = %required.0,
            granted_services = ?principal.admin_services,
            "Insufficient admin services"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Admin access to '{}' required",
            required.0
        )));
    }

    Ok(next.run(req).await)
}
