use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;
use super::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown email and wrong password both end up here.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("User not found")]
    UserNotFound,

    #[error("Default role '{0}' is not seeded")]
    DefaultRoleMissing(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::EmailAlreadyRegistered | ServiceError::Store(StoreError::Conflict(_)) => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::DefaultRoleMissing(role) => {
                AppError::InternalError(anyhow::anyhow!("Default role '{}' is not seeded", role))
            }
            ServiceError::Token(TokenError::Signing(e)) => {
                AppError::InternalError(anyhow::anyhow!("Failed to sign token: {}", e))
            }
            ServiceError::Token(e) => AppError::Unauthorized(anyhow::anyhow!(e)),
            ServiceError::Store(StoreError::Database(e)) => {
                AppError::DatabaseError(anyhow::Error::new(e))
            }
            ServiceError::Store(e @ StoreError::Unavailable(_)) => {
                AppError::DatabaseError(anyhow::Error::new(e))
            }
            ServiceError::Store(e @ StoreError::Integrity(_)) => {
                AppError::InternalError(anyhow::Error::new(e))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status(err: ServiceError) -> StatusCode {
        AppError::from(err).status_code()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status(ServiceError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServiceError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(ServiceError::EmailAlreadyRegistered), StatusCode::CONFLICT);
        assert_eq!(
            status(ServiceError::Store(StoreError::Conflict("users_email_key".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ServiceError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::Token(TokenError::Expired)), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(ServiceError::Token(TokenError::Signing("boom".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ServiceError::DefaultRoleMissing("User".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ServiceError::Store(StoreError::Unavailable("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ServiceError::Store(StoreError::Integrity("user_roles_role_id_fkey".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_failures_share_one_message() {
        let message = AppError::from(ServiceError::InvalidCredentials).to_string();
        assert_eq!(message, "Authentication error: Invalid credentials");
    }
}
