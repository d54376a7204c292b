//! Persistence port for users and the role/permission graph.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Permission, Role, RolePermission, User, UserProfileUpdate, UserRole};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write referenced a user or role that does not exist.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Narrow interface the auth core consumes.
///
/// Single-row lookups return `Ok(None)` when nothing matches; bulk lookups
/// skip ids that do not exist.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a user. A duplicate email yields `StoreError::Conflict`.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;

    /// Insert a user and its first role assignment as one unit: either both
    /// rows become visible or neither does.
    async fn save_user_with_role(&self, user: &User, user_role: &UserRole)
        -> Result<(), StoreError>;

    /// Apply a profile edit and bump `updated_at`, returning the stored row.
    /// Never writes the email or password hash. `Ok(None)` when no user has
    /// this id.
    async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserProfileUpdate,
    ) -> Result<Option<User>, StoreError>;

    async fn get_user_roles_by_user_id(&self, user_id: Uuid) -> Result<Vec<UserRole>, StoreError>;

    async fn get_roles_by_ids(&self, role_ids: &[Uuid]) -> Result<Vec<Role>, StoreError>;

    async fn get_role_permissions_by_role_id(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<RolePermission>, StoreError>;

    async fn get_permissions_by_ids(
        &self,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, StoreError>;

    async fn save_user_role(&self, user_role: &UserRole) -> Result<(), StoreError>;

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// The slice of the role/permission graph reachable from one user.
#[derive(Debug, Clone, Default)]
pub struct UserGraph {
    pub user_roles: Vec<UserRole>,
    pub roles: Vec<Role>,
    pub role_permissions: Vec<RolePermission>,
    pub permissions: Vec<Permission>,
}

/// Load every row needed to resolve a user's capabilities.
pub async fn load_user_graph(
    store: &dyn CredentialStore,
    user_id: Uuid,
) -> Result<UserGraph, StoreError> {
    let user_roles = store.get_user_roles_by_user_id(user_id).await?;
    if user_roles.is_empty() {
        return Ok(UserGraph::default());
    }

    let mut role_ids: Vec<Uuid> = user_roles.iter().map(|ur| ur.role_id).collect();
    role_ids.sort();
    role_ids.dedup();
    let roles = store.get_roles_by_ids(&role_ids).await?;

    let mut role_permissions = Vec::new();
    for role in &roles {
        role_permissions.extend(store.get_role_permissions_by_role_id(role.id).await?);
    }

    let mut permission_ids: Vec<Uuid> = role_permissions.iter().map(|rp| rp.permission_id).collect();
    permission_ids.sort();
    permission_ids.dedup();
    let permissions = if permission_ids.is_empty() {
        Vec::new()
    } else {
        store.get_permissions_by_ids(&permission_ids).await?
    };

    Ok(UserGraph {
        user_roles,
        roles,
        role_permissions,
        permissions,
    })
}
