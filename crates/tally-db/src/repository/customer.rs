//! # Customer Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::blocked_delete;
use crate::error::{DbError, DbResult};
use tally_core::input::CustomerInput;
use tally_core::{page_offset, Customer, Page, PageMeta, PAGE_SIZE};

const CUSTOMER_COLUMNS: &str = "id, name, email, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn list_paged(&self, page: u32) -> DbResult<Page<Customer>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        let data = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id DESC LIMIT ?1 OFFSET ?2"
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

    /// Every customer by name, for the checkout picker.
    pub async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        debug!(customer_id = customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: i64, input: &CustomerInput) -> DbResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET name = ?2, email = ?3, updated_at = ?4
            WHERE id = ?1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        customer.ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer. Customers referenced by an order are kept and the
    /// call fails with a foreign key violation.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM customers WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM orders WHERE customer_id = ?1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let mut conn = self.pool.acquire().await?;
            return Err(blocked_delete(&mut conn, "customers", "Customer", id, "orders").await);
        }

        Ok(())
    }
}
