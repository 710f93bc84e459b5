//! # Role Repository
//!
//! Roles, permissions and the association between them.
//!
//! ## Association Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update(role 2, permissions = [5, 9])                                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE roles SET name = ?            (only if a name was sent)       │
//! │    DELETE FROM role_permissions WHERE role_id = 2                       │
//! │    INSERT (2, 5), (2, 9)                (each id must exist)            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure drops the transaction: the old set stays in place.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use super::blocked_delete;
use crate::error::{DbError, DbResult};
use tally_core::input::RoleChanges;
use tally_core::{Permission, Role, RoleDetail};

/// Repository for roles and permissions.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoleRepository { pool }
    }

    /// All roles ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    /// All permissions ordered by id.
    pub async fn list_permissions(&self) -> DbResult<Vec<Permission>> {
        let permissions =
            sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(permissions)
    }

    /// A role with its permission set.
    pub async fn get(&self, id: i64) -> DbResult<Option<RoleDetail>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(role) = role else {
            return Ok(None);
        };

        let permissions = self.permissions_of(id).await?;
        Ok(Some(RoleDetail {
            id: role.id,
            name: role.name,
            permissions,
        }))
    }

    /// Permissions granted to a role.
    pub async fn permissions_of(&self, role_id: i64) -> DbResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name
            FROM role_permissions rp
            INNER JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ?1
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Permission names of a role, as the gate compares them.
    pub async fn permission_names_for_role(&self, role_id: i64) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM role_permissions rp
            INNER JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ?1
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Creates a role with its permission set in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name taken
    /// * `Err(DbError::NotFound)` - A permission id doesn't exist
    pub async fn create(&self, name: &str, permission_ids: &[i64]) -> DbResult<RoleDetail> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar("INSERT INTO roles (name) VALUES (?1) RETURNING id")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

        replace_permissions(&mut tx, id, permission_ids).await?;
        tx.commit().await?;

        info!(role_id = id, name = %name, "Role created");
        self.get(id).await?.ok_or_else(|| DbError::not_found("Role", id))
    }

    /// Applies whichever changes are present, atomically.
    pub async fn update(&self, id: i64, changes: &RoleChanges) -> DbResult<RoleDetail> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM roles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Role", id));
        }

        if let Some(name) = &changes.name {
            sqlx::query("UPDATE roles SET name = ?2 WHERE id = ?1")
                .bind(id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(permission_ids) = &changes.permission_ids {
            replace_permissions(&mut tx, id, permission_ids).await?;
        }

        tx.commit().await?;

        debug!(role_id = id, "Role updated");
        self.get(id).await?.ok_or_else(|| DbError::not_found("Role", id))
    }

    /// Deletes a role. Its permission associations go with it
    /// (`ON DELETE CASCADE`).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such role
    /// * `Err(DbError::ForeignKeyViolation)` - Users still hold the role
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM roles
            WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM users WHERE role_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let mut conn = self.pool.acquire().await?;
            return Err(blocked_delete(&mut conn, "roles", "Role", id, "users").await);
        }

        info!(role_id = id, "Role deleted");
        Ok(())
    }
}

/// Replaces a role's permission set inside an open transaction.
async fn replace_permissions(
    tx: &mut Transaction<'_, Sqlite>,
    role_id: i64,
    permission_ids: &[i64],
) -> DbResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = ?1")
        .bind(role_id)
        .execute(&mut **tx)
        .await?;

    for permission_id in permission_ids {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM permissions WHERE id = ?1")
            .bind(permission_id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Permission", permission_id));
        }

        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)")
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
