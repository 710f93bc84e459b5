//! # Permission Evaluator
//!
//! Answers "may this principal do `verb` on `resource`?" from the database.
//!
//! ```text
//! principal ──► users.role_id ──► role_permissions ──► permission names
//!                                                            │
//!                         tally_core::permission::evaluate ◄─┘
//! ```
//!
//! Nothing is cached: a role edit takes effect on the next request.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::ServiceResult;
use crate::repository::RoleRepository;
use tally_core::permission::{evaluate, AccessVerb};
use tally_core::CoreError;

#[derive(Debug, Clone)]
pub struct Authorizer {
    pool: SqlitePool,
}

impl Authorizer {
    pub fn new(pool: SqlitePool) -> Self {
        Authorizer { pool }
    }

    /// Permission names granted to a user through their role.
    ///
    /// ## Returns
    /// * `Err(Forbidden)` - The user no longer exists
    pub async fn granted(&self, user_id: i64) -> ServiceResult<Vec<String>> {
        let role_id: Option<i64> = sqlx::query_scalar("SELECT role_id FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let role_id = role_id.ok_or_else(|| CoreError::forbidden("unknown principal"))?;

        let names = RoleRepository::new(self.pool.clone())
            .permission_names_for_role(role_id)
            .await?;

        Ok(names)
    }

    /// Grants iff the user's role holds `{verb}_{resource}`.
    ///
    /// ## Returns
    /// * `Ok(())` - Access granted
    /// * `Err(Forbidden)` - Unknown user or missing permission
    pub async fn authorize(&self, user_id: i64, resource: &str, verb: AccessVerb) -> ServiceResult<()> {
        let granted = self.granted(user_id).await?;
        debug!(user_id, resource, verb = %verb, "Evaluating permission");
        evaluate(&granted, resource, verb)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::service::testing::{seed_user, seed_user_with_role, test_db};
    use tally_core::input::RoleChanges;

    #[tokio::test]
    async fn test_cashier_permissions() {
        let db = test_db().await;
        let cashier = seed_user(&db, "cashier@shop.io").await;
        let auth = db.authorizer();

        assert!(auth.authorize(cashier, "products", AccessVerb::View).await.is_ok());
        assert!(auth.authorize(cashier, "transactions", AccessVerb::Edit).await.is_ok());

        let err = auth
            .authorize(cashier, "products", AccessVerb::Edit)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(err.to_string().contains("edit_products"));
    }

    #[tokio::test]
    async fn test_admin_has_everything() {
        let db = test_db().await;
        let admin = seed_user_with_role(&db, "admin@shop.io", 1).await;

        for resource in tally_core::permission::RESOURCES {
            for verb in [AccessVerb::View, AccessVerb::Edit] {
                assert!(db.authorizer().authorize(admin, resource, verb).await.is_ok());
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_principal_is_forbidden() {
        let db = test_db().await;
        let err = db
            .authorizer()
            .authorize(9999, "products", AccessVerb::View)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_role_edit_applies_immediately() {
        let db = test_db().await;
        let cashier = seed_user(&db, "cashier@shop.io").await;
        assert!(db
            .authorizer()
            .authorize(cashier, "reports", AccessVerb::View)
            .await
            .is_err());

        let changes = RoleChanges {
            name: None,
            permission_ids: Some(vec![5, 7, 9, 10, 11]),
        };
        db.roles().update(2, &changes).await.unwrap();

        assert!(db
            .authorizer()
            .authorize(cashier, "reports", AccessVerb::View)
            .await
            .is_ok());
    }
}
