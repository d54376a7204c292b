use std::sync::Arc;

use validator::Validate;

use crate::{
    dtos::auth::{RegisterRequest, RegisterResponse},
    models::{Specification, User, UserRole},
    services::{CredentialStore, ServiceError, StoreError},
    utils::{hash_password_blocking, Password},
};

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn CredentialStore>,
    default_role_name: String,
    default_specification: Specification,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        default_role_name: String,
        default_specification: Specification,
    ) -> Self {
        Self {
            store,
            default_role_name,
            default_specification,
        }
    }

    /// Create a password account holding the default role.
    ///
    /// The user row and its role assignment are written together; if either
    /// write fails, neither is visible.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ServiceError> {
        req.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let email = req.email.trim().to_string();

        if self.store.get_user_by_email(&email).await?.is_some() {
            tracing::warn!(email = %email, "Registration rejected: email already registered");
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let role = self
            .store
            .get_role_by_name(&self.default_role_name)
            .await?
            .ok_or_else(|| {
                tracing::error!(role = %self.default_role_name, "Default role is not seeded");
                ServiceError::DefaultRoleMissing(self.default_role_name.clone())
            })?;

        let password_hash = hash_password_blocking(Password::new(req.password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(
            req.name.trim().to_string(),
            email,
            password_hash,
            self.default_specification,
        );
        let user_role = UserRole::new(user.id, role.id);

        // A concurrent registration can still win the race past the lookup above.
        self.store
            .save_user_with_role(&user, &user_role)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ServiceError::EmailAlreadyRegistered,
                other => ServiceError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, role = %role.name, "User registered");

        Ok(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.sanitized(),
        })
    }
}
