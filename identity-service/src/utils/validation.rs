use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::{Validate, ValidationError};

/// Shallow syntactic check: the address must contain both `@` and `.`.
///
/// Not RFC 5322 validation; anything plausible gets through to the store.
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || !email.contains('.') {
        let mut err = ValidationError::new("email_shape");
        err.message = Some("Invalid email format".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_specification(value: &str) -> Result<(), ValidationError> {
    if value.parse::<crate::models::Specification>().is_err() {
        let mut err = ValidationError::new("specification");
        err.message = Some("unknown specification".into());
        return Err(err);
    }
    Ok(())
}

/// JSON body extractor that runs `validator` rules before the handler.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(validate_email_shape("ada@example.com").is_ok());
        assert!(validate_email_shape("a@b.c").is_ok());
        assert!(validate_email_shape("").is_err());
        assert!(validate_email_shape("   ").is_err());
        assert!(validate_email_shape("ada.example.com").is_err());
        assert!(validate_email_shape("ada@example").is_err());
    }

    #[test]
    fn test_specification() {
        assert!(validate_specification("Machine Learning").is_ok());
        assert!(validate_specification("machine learning").is_err());
        assert!(validate_specification("").is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Ada").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t").is_err());
    }
}
