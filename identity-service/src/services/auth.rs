use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        auth::{LoginRequest, TokenResponse},
        user::UpdateUserRequest,
    },
    models::{Permission, UserResponse, UserRole},
    services::{
        load_user_graph, resolve_admin_services, CredentialStore, JwtService, ServiceError,
    },
    utils::{verify_password_blocking, Password},
};

/// Well-formed Argon2id hash that matches no password. Unknown emails are
/// verified against it so they cost the same as a wrong password.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$\
                                   AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Exchange email and password for a session token.
    ///
    /// Admin services are resolved from the role graph now and frozen into
    /// the token until it expires.
    pub async fn authenticate(&self, req: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let email = req.email.trim();
        let user = self.store.get_user_by_email(email).await?;

        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_PASSWORD_HASH.to_string());
        let password_ok = verify_password_blocking(Password::new(req.password), stored_hash)
            .await
            .map_err(ServiceError::Internal)?;

        let user = match user {
            Some(user) if password_ok => user,
            _ => {
                tracing::warn!(email = %email, "Login failed: invalid credentials");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let graph = load_user_graph(self.store.as_ref(), user.id).await?;
        let admin_services = resolve_admin_services(
            &graph.user_roles,
            &graph.roles,
            &graph.role_permissions,
            &graph.permissions,
            user.id,
        );

        let access_token =
            self.jwt
                .issue_session_token(user.id, &user.email, admin_services.into_iter().collect())?;

        tracing::info!(user_id = %user.id, "User authenticated");

        Ok(TokenResponse::bearer(
            access_token,
            self.jwt.token_expiry_seconds(),
        ))
    }

    /// Stored profile of a user, without credential material.
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(ServiceError::UserNotFound)
    }

    /// Edit the profile of `user_id`. Credentials are never touched here.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        req.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let update = req.into_update();
        if update.is_empty() {
            return Err(ServiceError::Validation(
                "No profile fields to update".to_string(),
            ));
        }

        let user = self
            .store
            .update_user(user_id, &update)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(UserResponse::from(user))
    }

    pub async fn user_roles(&self, user_id: Uuid) -> Result<Vec<UserRole>, ServiceError> {
        Ok(self.store.get_user_roles_by_user_id(user_id).await?)
    }

    /// Every permission reachable from any of the user's roles, once each,
    /// ordered by name.
    pub async fn user_permissions(&self, user_id: Uuid) -> Result<Vec<Permission>, ServiceError> {
        let graph = load_user_graph(self.store.as_ref(), user_id).await?;

        let mut by_name: BTreeMap<(String, Uuid), Permission> = BTreeMap::new();
        for permission in graph.permissions {
            by_name.insert((permission.name.clone(), permission.id), permission);
        }

        Ok(by_name.into_values().collect())
    }
}
