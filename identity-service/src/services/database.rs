//! PostgreSQL adapter for the credential store.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::store::{CredentialStore, StoreError};
use crate::models::{Permission, Role, RolePermission, User, UserProfileUpdate, UserRole};

const USER_COLUMNS: &str = "id, name, email, password_hash, specification, telegram, about, \
                            photo_url, resume_url, created_at, updated_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations (SQLSTATE 23505) become `Conflict` and foreign key
/// violations (23503) become `Integrity`; everything else is passed through.
fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict(
            db_err
                .constraint()
                .unwrap_or("unique constraint")
                .to_string(),
        ),
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::Integrity(
                db_err
                    .constraint()
                    .unwrap_or("foreign key constraint")
                    .to_string(),
            )
        }
        _ => StoreError::Database(err),
    }
}

async fn insert_user<'e, E>(executor: E, user: &User) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, specification, telegram, about,
                           photo_url, resume_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.specification)
    .bind(&user.telegram)
    .bind(&user.about)
    .bind(&user.photo_url)
    .bind(&user.resume_url)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(executor)
    .await
    .map_err(map_write_error)?;
    Ok(())
}

async fn insert_user_role<'e, E>(executor: E, user_role: &UserRole) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query("INSERT INTO user_roles (id, user_id, role_id) VALUES ($1, $2, $3)")
        .bind(user_role.id)
        .bind(user_role.user_id)
        .bind(user_role.role_id)
        .execute(executor)
        .await
        .map_err(map_write_error)?;
    Ok(())
}

#[async_trait]
impl CredentialStore for Database {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        insert_user(&self.pool, user).await
    }

    async fn save_user_with_role(
        &self,
        user: &User,
        user_role: &UserRole,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        insert_user(&mut *tx, user).await?;
        insert_user_role(&mut *tx, user_role).await?;

        // Dropping `tx` on an early return rolls both inserts back.
        tx.commit().await?;
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                specification = COALESCE($3, specification),
                telegram = COALESCE($4, telegram),
                about = COALESCE($5, about),
                photo_url = COALESCE($6, photo_url),
                resume_url = COALESCE($7, resume_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.name)
        .bind(update.specification.map(|s| s.as_str()))
        .bind(&update.telegram)
        .bind(&update.about)
        .bind(&update.photo_url)
        .bind(&update.resume_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(user)
    }

    async fn get_user_roles_by_user_id(&self, user_id: Uuid) -> Result<Vec<UserRole>, StoreError> {
        let rows = sqlx::query_as::<_, UserRole>(
            "SELECT id, user_id, role_id FROM user_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_roles_by_ids(&self, role_ids: &[Uuid]) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = ANY($1)")
            .bind(role_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_role_permissions_by_role_id(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<RolePermission>, StoreError> {
        let rows = sqlx::query_as::<_, RolePermission>(
            "SELECT id, role_id, permission_id FROM role_permissions WHERE role_id = $1",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_permissions_by_ids(
        &self,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, StoreError> {
        let rows =
            sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions WHERE id = ANY($1)")
                .bind(permission_ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn save_user_role(&self, user_role: &UserRole) -> Result<(), StoreError> {
        insert_user_role(&self.pool, user_role).await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                StoreError::Unavailable(e.to_string())
            })?;
        Ok(())
    }
}
