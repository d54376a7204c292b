//! In-memory `CredentialStore` for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::store::{CredentialStore, StoreError};
use crate::models::{Permission, Role, RolePermission, User, UserProfileUpdate, UserRole};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    permissions: HashMap<Uuid, Permission>,
    user_roles: Vec<UserRole>,
    role_permissions: Vec<RolePermission>,
}

/// Tables behind one mutex, so multi-row writes are atomic.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given role names, like a fresh migration.
    pub fn with_roles(names: &[&str]) -> Self {
        let store = Self::new();
        for name in names {
            store.add_role(*name);
        }
        store
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    /// Make every subsequent call fail, simulating a lost connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn add_role(&self, name: &str) -> Role {
        let role = Role::new(name);
        if let Ok(mut tables) = self.tables.lock() {
            tables.roles.insert(role.id, role.clone());
        }
        role
    }

    pub fn add_permission(&self, name: &str) -> Permission {
        let permission = Permission::new(name);
        if let Ok(mut tables) = self.tables.lock() {
            tables.permissions.insert(permission.id, permission.clone());
        }
        permission
    }

    /// Attach a permission to a role.
    pub fn grant(&self, role_id: Uuid, permission_id: Uuid) {
        if let Ok(mut tables) = self.tables.lock() {
            tables
                .role_permissions
                .push(RolePermission::new(role_id, permission_id));
        }
    }

    /// Detach a permission from a role.
    pub fn revoke(&self, role_id: Uuid, permission_id: Uuid) {
        if let Ok(mut tables) = self.tables.lock() {
            tables
                .role_permissions
                .retain(|rp| !(rp.role_id == role_id && rp.permission_id == permission_id));
        }
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().map(|t| t.users.len()).unwrap_or(0)
    }

    pub fn user_role_count(&self) -> usize {
        self.tables.lock().map(|t| t.user_roles.len()).unwrap_or(0)
    }
}

fn insert_user(tables: &mut Tables, user: &User) -> Result<(), StoreError> {
    if tables.users.contains_key(&user.id) {
        return Err(StoreError::Conflict("users_pkey".to_string()));
    }
    if tables.users.values().any(|u| u.email == user.email) {
        return Err(StoreError::Conflict("users_email_key".to_string()));
    }
    tables.users.insert(user.id, user.clone());
    Ok(())
}

fn check_user_role(tables: &Tables, user_role: &UserRole) -> Result<(), StoreError> {
    if !tables.roles.contains_key(&user_role.role_id) {
        return Err(StoreError::Integrity(format!(
            "role {} does not exist",
            user_role.role_id
        )));
    }
    if tables
        .user_roles
        .iter()
        .any(|ur| ur.user_id == user_role.user_id && ur.role_id == user_role.role_id)
    {
        return Err(StoreError::Conflict("user_roles_user_id_role_id_key".to_string()));
    }
    Ok(())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.get(&user_id).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        insert_user(&mut tables, user)
    }

    async fn save_user_with_role(
        &self,
        user: &User,
        user_role: &UserRole,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        // Both checks run before either row is written.
        check_user_role(&tables, user_role)?;
        insert_user(&mut tables, user)?;
        tables.user_roles.push(user_role.clone());
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables.users.get_mut(&user_id).map(|user| {
            update.apply_to(user);
            user.clone()
        }))
    }

    async fn get_user_roles_by_user_id(&self, user_id: Uuid) -> Result<Vec<UserRole>, StoreError> {
        Ok(self
            .tables()?
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_roles_by_ids(&self, role_ids: &[Uuid]) -> Result<Vec<Role>, StoreError> {
        let tables = self.tables()?;
        Ok(role_ids
            .iter()
            .filter_map(|id| tables.roles.get(id))
            .cloned()
            .collect())
    }

    async fn get_role_permissions_by_role_id(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<RolePermission>, StoreError> {
        Ok(self
            .tables()?
            .role_permissions
            .iter()
            .filter(|rp| rp.role_id == role_id)
            .cloned()
            .collect())
    }

    async fn get_permissions_by_ids(
        &self,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, StoreError> {
        let tables = self.tables()?;
        Ok(permission_ids
            .iter()
            .filter_map(|id| tables.permissions.get(id))
            .cloned()
            .collect())
    }

    async fn save_user_role(&self, user_role: &UserRole) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_role.user_id) {
            return Err(StoreError::Integrity(format!(
                "user {} does not exist",
                user_role.user_id
            )));
        }
        check_user_role(&tables, user_role)?;
        tables.user_roles.push(user_role.clone());
        Ok(())
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self
            .tables()?
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Specification;

    fn user(email: &str) -> User {
        User::new(
            "Ada".to_string(),
            email.to_string(),
            "$argon2id$hash".to_string(),
            Specification::Frontend,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = InMemoryCredentialStore::new();
        store.save_user(&user("ada@example.com")).await.unwrap();

        let err = store.save_user(&user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_save_user_with_missing_role_writes_nothing() {
        let store = InMemoryCredentialStore::new();
        let u = user("ada@example.com");

        let result = store
            .save_user_with_role(&u, &UserRole::new(u.id, Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(StoreError::Integrity(_))));
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.user_role_count(), 0);
    }

    #[tokio::test]
    async fn test_role_for_unknown_user_is_integrity_error() {
        let store = InMemoryCredentialStore::with_roles(&["User"]);
        let role = store.get_role_by_name("User").await.unwrap().unwrap();

        let err = store
            .save_user_role(&UserRole::new(Uuid::new_v4(), role.id))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Integrity(_)));
        assert_eq!(store.user_role_count(), 0);
    }

    #[tokio::test]
    async fn test_save_user_with_role_on_duplicate_email_writes_no_role() {
        let store = InMemoryCredentialStore::with_roles(&["User"]);
        let role = store.get_role_by_name("User").await.unwrap().unwrap();
        store.save_user(&user("ada@example.com")).await.unwrap();

        let second = user("ada@example.com");
        let err = store
            .save_user_with_role(&second, &UserRole::new(second.id, role.id))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.user_role_count(), 0);
    }

    #[tokio::test]
    async fn test_update_user_keeps_credentials_and_bumps_timestamp() {
        let store = InMemoryCredentialStore::new();
        let original = user("ada@example.com");
        store.save_user(&original).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let update = UserProfileUpdate {
            name: Some("Ada King".to_string()),
            telegram: Some("@ada".to_string()),
            ..Default::default()
        };
        let updated = store.update_user(original.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.telegram.as_deref(), Some("@ada"));
        assert_eq!(updated.email, original.email);
        assert_eq!(updated.password_hash, original.password_hash);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);

        let stored = store.get_user_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada King");
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_none() {
        let store = InMemoryCredentialStore::new();
        let result = store
            .update_user(Uuid::new_v4(), &UserProfileUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_bulk_lookups_skip_unknown_ids() {
        let store = InMemoryCredentialStore::new();
        let role = store.add_role("Admin");
        let permission = store.add_permission("admin_users");

        let roles = store
            .get_roles_by_ids(&[role.id, Uuid::new_v4()])
            .await
            .unwrap();
        let permissions = store
            .get_permissions_by_ids(&[Uuid::new_v4(), permission.id])
            .await
            .unwrap();

        assert_eq!(roles, vec![role]);
        assert_eq!(permissions, vec![permission]);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = InMemoryCredentialStore::new();
        store.set_unavailable(true);

        assert!(store.health_check().await.is_err());
        assert!(store.get_user_by_email("ada@example.com").await.is_err());

        store.set_unavailable(false);
        assert!(store.health_check().await.is_ok());
    }
}
