//! # User Repository
//!
//! Staff accounts. Password hashes are read only through
//! [`UserRepository::get_credentials_by_email`] and never leave this crate
//! inside a [`User`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::blocked_delete;
use crate::error::{DbError, DbResult};
use tally_core::{page_offset, Page, PageMeta, User, PAGE_SIZE};

const USER_SELECT: &str = r#"
    SELECT u.id, u.first_name, u.last_name, u.email, u.role_id,
           r.name AS role_name, u.created_at, u.updated_at
    FROM users u
    INNER JOIN roles r ON r.id = u.role_id
"#;

/// Id and stored hash for a login attempt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub password_hash: String,
}

/// Fields written when creating an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role_id: i64,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists one page of users with their role name.
    pub async fn list_paged(&self, page: u32) -> DbResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let data = sqlx::query_as::<_, User>(&format!(
            "{USER_SELECT} ORDER BY u.id LIMIT ?1 OFFSET ?2"
        ))
        .bind(PAGE_SIZE as i64)
        .bind(page_offset(page))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            data,
            meta: PageMeta::new(total, page),
        })
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Looks up the stored hash for an email (already normalized).
    pub async fn get_credentials_by_email(&self, email: &str) -> DbResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    /// Creates an account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email taken
    /// * `Err(DbError::ForeignKeyViolation)` - Role doesn't exist
    pub async fn create(&self, new_user: NewUser<'_>) -> DbResult<User> {
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (
                first_name, last_name, email, password_hash, role_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING id
            "#,
        )
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.role_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = id, role_id = new_user.role_id, "User created");
        self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))
    }

    /// Updates name, email and role.
    pub async fn update(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        email: &str,
        role_id: i64,
    ) -> DbResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                first_name = ?2, last_name = ?3, email = ?4, role_id = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        debug!(user_id = id, "User updated");
        self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))
    }

    /// Updates name and email, keeping the role.
    pub async fn update_info(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> DbResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET first_name = ?2, last_name = ?3, email = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn update_password_hash(&self, id: i64, password_hash: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Deletes an account. Fails with a foreign key violation while the
    /// user has orders on record.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM users WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM orders WHERE user_id = ?1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let mut conn = self.pool.acquire().await?;
            return Err(blocked_delete(&mut conn, "users", "User", id, "orders").await);
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
