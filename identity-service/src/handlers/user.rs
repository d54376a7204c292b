use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::user::UpdateUserRequest, middleware::AuthUser, utils::ValidatedJson, AppState,
};

/// GET /me
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.get_user(principal.user_id).await?;
    Ok(Json(user))
}

/// PATCH /update_user_info, always against the caller's own row.
pub async fn update_user_info(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth_service
        .update_profile(principal.user_id, req)
        .await?;
    Ok(Json(user))
}

/// GET /get_user_roles
pub async fn get_user_roles(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let roles = state.auth_service.user_roles(principal.user_id).await?;
    Ok(Json(roles))
}

/// GET /get_user_properties
pub async fn get_user_properties(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let permissions = state.auth_service.user_permissions(principal.user_id).await?;
    Ok(Json(permissions))
}

/// GET /users/:user_id, admin service `users` only.
pub async fn get_user_by_id(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(user_id) =
        user_id.map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid user id: {}", e)))?;

    let user = state.auth_service.get_user(user_id).await?;
    Ok(Json(user))
}
