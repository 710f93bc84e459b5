//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Paginated listing for the back office
//! - Barcode lookup for the register
//! - CRUD with direct stock edits
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes products.stock                            │
//! │                                                                         │
//! │  Product management (this repository)                                  │
//! │       └── UPDATE products SET stock = ?      (absolute, admin edit)    │
//! │                                                                         │
//! │  Checkout (service::checkout)                                          │
//! │       └── UPDATE products SET stock = stock - ?                        │
//! │           WHERE id = ? AND stock >= ?        (conditional decrement)   │
//! │                                                                         │
//! │  Cart lines never touch stock.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::blocked_delete;
use crate::error::{DbError, DbResult};
use tally_core::input::ProductInput;
use tally_core::{page_offset, Page, PageMeta, Product, Quantity, PAGE_SIZE};

const PRODUCT_COLUMNS: &str = "id, barcode, title, description, stock, price, \
     sell_price, image_url, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let page = repo.list_paged(1).await?;
/// let scanned = repo.get_by_barcode("8991002101234").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists one page of products, newest first.
    pub async fn list_paged(&self, page: u32) -> DbResult<Page<Product>> {
        let total = self.count().await?;

        let data = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC LIMIT ?1 OFFSET ?2"
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

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode (exact match).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// A missing barcode is replaced by a generated one.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert(&self, input: &ProductInput, image_url: Option<&str>) -> DbResult<Product> {
        let barcode = input.barcode.clone().unwrap_or_else(generate_barcode);
        let now = Utc::now();

        debug!(barcode = %barcode, title = %input.title, "Inserting product");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                barcode, title, description, stock, price, sell_price,
                image_url, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&barcode)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.stock)
        .bind(input.price)
        .bind(input.sell_price)
        .bind(image_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates an existing product in one statement. Stock is set, not
    /// adjusted.
    ///
    /// A missing barcode keeps the current one, and so does a missing
    /// `image_url`.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(
        &self,
        id: i64,
        input: &ProductInput,
        image_url: Option<&str>,
    ) -> DbResult<Product> {
        debug!(id = id, new_image = image_url.is_some(), "Updating product");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                barcode = COALESCE(?2, barcode),
                title = ?3,
                description = ?4,
                stock = ?5,
                price = ?6,
                sell_price = ?7,
                image_url = COALESCE(?8, image_url),
                updated_at = ?9
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.barcode.as_deref())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.stock)
        .bind(input.price)
        .bind(input.sell_price)
        .bind(image_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product and returns what was deleted.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Product appears on an order
    pub async fn delete(&self, id: i64) -> DbResult<Product> {
        debug!(id = id, "Deleting product");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            DELETE FROM products
            WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM order_lines WHERE product_id = ?1)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match product {
            Some(product) => Ok(product),
            None => {
                let mut conn = self.pool.acquire().await?;
                Err(blocked_delete(&mut conn, "products", "Product", id, "order lines").await)
            }
        }
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Checkout transaction
    // =========================================================================

    /// Reads a product on an open transaction.
    pub async fn get_in(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Takes `qty` off the stock only if enough is left.
    ///
    /// ## Returns
    /// * `Ok(true)` - Decremented
    /// * `Ok(false)` - Stock too low (or product gone), nothing changed
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        id: i64,
        qty: Quantity,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products SET stock = stock - ?1, updated_at = ?3
            WHERE id = ?2 AND stock >= ?1
            "#,
        )
        .bind(qty)
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Generates a barcode for products created without one.
pub fn generate_barcode() -> String {
    Uuid::new_v4().simple().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tally_core::{Money, Quantity};

    fn input(title: &str, barcode: Option<&str>) -> ProductInput {
        ProductInput {
            title: title.to_string(),
            description: String::new(),
            barcode: barcode.map(str::to_string),
            price: Money::from_cents(800),
            sell_price: Money::from_cents(1200),
            stock: Quantity::from_units(10),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_barcode() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let product = db.products().insert(&input("Coffee", None), None).await.unwrap();
        assert!(!product.barcode.is_empty());

        let found = db.products().get_by_barcode(&product.barcode).await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(product.id));
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.products().insert(&input("Coffee", Some("111")), None).await.unwrap();
        let err = db
            .products()
            .insert(&input("Tea", Some("111")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_sets_stock_and_keeps_barcode() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.products().insert(&input("Coffee", Some("222")), None).await.unwrap();

        let mut changes = input("Coffee Beans", None);
        changes.stock = Quantity::from_milli(2500);
        let updated = db.products().update(created.id, &changes, None).await.unwrap();

        assert_eq!(updated.title, "Coffee Beans");
        assert_eq!(updated.barcode, "222");
        assert_eq!(updated.stock, Quantity::from_milli(2500));

        let err = db.products().update(999, &changes, None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_swaps_image_with_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db
            .products()
            .insert(&input("Coffee", Some("333")), Some("/img/old.png"))
            .await
            .unwrap();
        db.products().insert(&input("Tea", Some("444")), None).await.unwrap();

        let updated = db
            .products()
            .update(created.id, &input("Coffee 1kg", None), Some("/img/new.png"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Coffee 1kg");
        assert_eq!(updated.image_url.as_deref(), Some("/img/new.png"));

        // a rejected update leaves both the fields and the image alone
        let err = db
            .products()
            .update(created.id, &input("Clash", Some("444")), Some("/img/other.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let current = db.products().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(current.title, "Coffee 1kg");
        assert_eq!(current.image_url.as_deref(), Some("/img/new.png"));
    }

    #[tokio::test]
    async fn test_list_paged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for i in 0..7 {
            db.products()
                .insert(&input(&format!("Item {}", i), None), None)
                .await
                .unwrap();
        }

        let first = db.products().list_paged(1).await.unwrap();
        assert_eq!(first.data.len(), 5);
        assert_eq!(first.meta.total, 7);
        assert_eq!(first.meta.last_page, 2);

        let second = db.products().list_paged(2).await.unwrap();
        assert_eq!(second.data.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_returns_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db
            .products()
            .insert(&input("Coffee", None), Some("/uploads/a.png"))
            .await
            .unwrap();

        let deleted = db.products().delete(created.id).await.unwrap();
        assert_eq!(deleted.image_url.as_deref(), Some("/uploads/a.png"));
        assert!(db.products().get_by_id(created.id).await.unwrap().is_none());
        assert!(db.products().delete(created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_decrement_stock_is_conditional() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.products().insert(&input("Coffee", None), None).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let now = Utc::now();
        assert!(ProductRepository::decrement_stock(&mut tx, created.id, Quantity::from_units(4), now)
            .await
            .unwrap());
        assert!(!ProductRepository::decrement_stock(&mut tx, created.id, Quantity::from_units(7), now)
            .await
            .unwrap());
        let seen = ProductRepository::get_in(&mut tx, created.id).await.unwrap().unwrap();
        assert_eq!(seen.stock, Quantity::from_units(6));
        tx.rollback().await.unwrap();

        let product = db.products().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_units(10));
    }
}
