//! # Checkout Committer
//!
//! Turns a user's cart into an order in one SQLite transaction.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     commit(user, request)                               │
//! │                                                                         │
//! │  validate request, customer exists, cart non-empty, cash covers total  │
//! │       │                     (cheap pre-checks, no lock held)            │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  ├── DELETE FROM cart_lines WHERE user_id = ? RETURNING ...            │
//! │  │      claims the cart and takes the write lock; a second submit      │
//! │  │      of the same cart waits here and then finds nothing            │
//! │  ├── recompute totals from the claimed lines                           │
//! │  ├── per product: stock ≥ Σ qty ?               else OutOfStock        │
//! │  ├── INSERT orders (invoice NULL)                                       │
//! │  ├── per line: INSERT order_lines, INSERT profits                       │
//! │  ├── per product: UPDATE stock = stock − Σ qty WHERE stock ≥ Σ qty     │
//! │  └── UPDATE orders SET invoice = "yy.m.INV/ORD/id"                      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: cart, stock and        │
//! │  orders are exactly as they were.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::{
    CartRepository, CustomerRepository, NewOrder, OrderRepository, ProductRepository,
};
use tally_core::checkout::{invoice_code, line_profit, quantity_by_product, CheckoutTotals};
use tally_core::input::CheckoutRequest;
use tally_core::{CoreError, Order, Product, Quantity};

#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Commits the cart of `user_id` as an order.
    ///
    /// ## Returns
    /// * `Ok(Order)` - Committed order with lines, invoice and discount echo
    /// * `Err(Validation)` - Bad discount, cash or customer id
    /// * `Err(NotFound)` - Customer or a cart product no longer exists
    /// * `Err(EmptyCart)` - Nothing to check out (or already checked out)
    /// * `Err(InsufficientCash)` - `cash < grand_total`
    /// * `Err(OutOfStock)` - Stock can't cover a product's total quantity
    ///
    /// ## Example
    /// ```rust,ignore
    /// let order = db.checkout().commit(user_id, &request).await?;
    /// println!("{}", order.invoice.unwrap_or_default());
    /// ```
    pub async fn commit(&self, user_id: i64, request: &CheckoutRequest) -> ServiceResult<Order> {
        let rate = request.validate()?;

        if let Some(customer_id) = request.customer_id {
            CustomerRepository::new(self.pool.clone())
                .get(customer_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Customer", customer_id))?;
        }

        // Pre-check outside the transaction so obvious failures take no lock
        let pending = CartRepository::new(self.pool.clone())
            .lines_for_user(user_id)
            .await?;
        CheckoutTotals::compute(&pending, rate, request.cash)?;

        let mut tx = self.pool.begin().await?;

        let claimed = CartRepository::claim_for_user(&mut tx, user_id).await?;
        debug!(user_id, lines = claimed.len(), "Cart claimed");

        let totals = CheckoutTotals::compute(&claimed, rate, request.cash)?;
        let wanted = quantity_by_product(&claimed);

        let mut products: BTreeMap<i64, Product> = BTreeMap::new();
        for (&product_id, &requested) in &wanted {
            let product = ProductRepository::get_in(&mut tx, product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", product_id))?;

            if product.stock < requested {
                warn!(product_id, available = %product.stock, requested = %requested, "Checkout refused: stock");
                return Err(out_of_stock(product, requested));
            }

            products.insert(product_id, product);
        }

        let now = Utc::now();
        let (order_id, created_at) = OrderRepository::insert_order(
            &mut tx,
            &NewOrder {
                user_id,
                customer_id: request.customer_id,
                cash: request.cash,
                change: totals.change,
                discount: totals.discount,
                grand_total: totals.grand_total,
                created_at: now,
            },
        )
        .await?;

        for line in &claimed {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| CoreError::not_found("Product", line.product_id))?;

            let order_line_id =
                OrderRepository::insert_line(&mut tx, order_id, line.product_id, line.qty, line.price)
                    .await?;

            // Profit uses the product's prices now, not the frozen cart price
            let profit = line_profit(product.sell_price, product.price, line.qty)?;
            OrderRepository::insert_profit(&mut tx, order_id, order_line_id, profit, now).await?;
        }

        for (&product_id, &requested) in &wanted {
            if !ProductRepository::decrement_stock(&mut tx, product_id, requested, now).await? {
                let product = products
                    .remove(&product_id)
                    .ok_or_else(|| CoreError::not_found("Product", product_id))?;
                return Err(out_of_stock(product, requested));
            }
        }

        let invoice = invoice_code(created_at, order_id);
        if !OrderRepository::assign_invoice(&mut tx, order_id, &invoice).await? {
            return Err(DbError::Internal(format!("order {order_id} already has an invoice")).into());
        }

        tx.commit().await?;

        info!(
            order_id,
            user_id,
            invoice = %invoice,
            grand_total = %totals.grand_total,
            lines = claimed.len(),
            "Order committed"
        );

        let mut order = OrderRepository::new(self.pool.clone())
            .get_with_lines(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        order.discount_percent = Some(request.discount_percent);

        Ok(order)
    }
}

fn out_of_stock(product: Product, requested: Quantity) -> ServiceError {
    CoreError::OutOfStock {
        product: product.title,
        available: product.stock,
        requested,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::service::testing::{add_line, seed_customer, seed_product, seed_user, test_db};
    use crate::{Database, DbConfig};
    use chrono::Datelike;
    use tally_core::{Money, Quantity};

    fn request(customer_id: Option<i64>, discount_percent: f64, cash: i64) -> CheckoutRequest {
        CheckoutRequest {
            customer_id,
            discount_percent,
            cash: Money::from_cents(cash),
        }
    }

    #[tokio::test]
    async fn test_checkout_example_scenario() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let customer = seed_customer(&db, "budi@mail.io").await;
        let a = seed_product(&db, "A", 600, 1000, 10).await;
        let b = seed_product(&db, "B", 300, 500, 5).await;

        add_line(&db, user, a.id, Quantity::from_units(2)).await;
        add_line(&db, user, b.id, Quantity::from_units(1)).await;

        let order = db
            .checkout()
            .commit(user, &request(Some(customer), 10.0, 3000))
            .await
            .unwrap();

        assert_eq!(order.grand_total, Money::from_cents(2250));
        assert_eq!(order.discount, Money::from_cents(250));
        assert_eq!(order.change, Money::from_cents(750));
        assert_eq!(order.cash, Money::from_cents(3000));
        assert_eq!(order.discount_percent, Some(10.0));
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].product_title, "A");

        let expected = format!(
            "{:02}.{}.INV/ORD/{}",
            order.created_at.year() % 100,
            order.created_at.month(),
            order.id
        );
        assert_eq!(order.invoice.as_deref(), Some(expected.as_str()));

        let a = db.products().get_by_id(a.id).await.unwrap().unwrap();
        let b = db.products().get_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(a.stock, Quantity::from_units(8));
        assert_eq!(b.stock, Quantity::from_units(4));

        assert!(db.cart_store().get_cart(user).await.unwrap().items.is_empty());

        let profits = db.orders().profits(order.id).await.unwrap();
        let totals: Vec<i64> = profits.iter().map(|p| p.total.cents()).collect();
        assert_eq!(totals, vec![800, 200]);
    }

    #[tokio::test]
    async fn test_profit_uses_current_product_prices() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "A", 600, 1000, 10).await;
        add_line(&db, user, product.id, Quantity::from_units(1)).await;

        // repriced after the line was added
        let repriced = tally_core::input::ProductInput {
            title: "A".to_string(),
            description: String::new(),
            barcode: None,
            price: Money::from_cents(700),
            sell_price: Money::from_cents(1500),
            stock: Quantity::from_units(10),
        };
        db.products().update(product.id, &repriced, None).await.unwrap();

        let order = db.checkout().commit(user, &request(None, 0.0, 1000)).await.unwrap();
        assert_eq!(order.grand_total, Money::from_cents(1000));

        let profits = db.orders().profits(order.id).await.unwrap();
        assert_eq!(profits[0].total, Money::from_cents(800));
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;

        let err = db.checkout().commit(user, &request(None, 0.0, 100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCart);
    }

    #[tokio::test]
    async fn test_insufficient_cash_changes_nothing() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "A", 600, 1000, 10).await;
        add_line(&db, user, product.id, Quantity::from_units(2)).await;

        let err = db.checkout().commit(user, &request(None, 0.0, 1999)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientCash);

        assert_eq!(db.cart_store().get_cart(user).await.unwrap().items.len(), 1);
        let product = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_units(10));
    }

    #[tokio::test]
    async fn test_out_of_stock_sums_duplicate_lines() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "Rice", 600, 1000, 5).await;
        add_line(&db, user, product.id, Quantity::from_units(3)).await;
        add_line(&db, user, product.id, Quantity::from_units(3)).await;

        let err = db.checkout().commit(user, &request(None, 0.0, 100_000)).await.unwrap_err();
        match err {
            crate::error::ServiceError::Domain(CoreError::OutOfStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Rice");
                assert_eq!(available, Quantity::from_units(5));
                assert_eq!(requested, Quantity::from_units(6));
            }
            other => panic!("expected OutOfStock, got {:?}", other),
        }

        // rolled back: cart intact, stock intact, no order
        assert_eq!(db.cart_store().get_cart(user).await.unwrap().items.len(), 2);
        let product = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_units(5));
        assert_eq!(db.orders().list_paged(1).await.unwrap().meta.total, 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_and_bad_discount() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "A", 600, 1000, 5).await;
        add_line(&db, user, product.id, Quantity::from_units(1)).await;

        let err = db.checkout().commit(user, &request(Some(77), 0.0, 1000)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = db.checkout().commit(user, &request(None, 101.0, 1000)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_fractional_quantities() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "Cheese", 1000, 2000, 2).await;
        add_line(&db, user, product.id, Quantity::from_milli(1250)).await;

        let order = db.checkout().commit(user, &request(None, 0.0, 2500)).await.unwrap();
        assert_eq!(order.grand_total, Money::from_cents(2500));
        assert!(order.change.is_zero());

        let product = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_milli(750));
    }

    #[tokio::test]
    async fn test_reports_cover_committed_orders() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "A", 600, 1000, 10).await;
        add_line(&db, user, product.id, Quantity::from_units(2)).await;
        let order = db.checkout().commit(user, &request(None, 0.0, 2000)).await.unwrap();

        let today = order.created_at.date_naive();
        let sales = db.reports().sales_between(today, today).await.unwrap();
        assert_eq!(sales.rows.len(), 1);
        assert_eq!(sales.rows[0].cashier, "Test User");
        assert_eq!(sales.rows[0].line_count, 1);
        assert_eq!(sales.total, Money::from_cents(2000));

        let profits = db.reports().profits_between(today, today).await.unwrap();
        assert_eq!(profits.total, Money::from_cents(800));
        assert_eq!(profits.rows[0].invoice, order.invoice);

        let yesterday = today.pred_opt().unwrap();
        let empty = db.reports().sales_between(yesterday, yesterday).await.unwrap();
        assert!(empty.rows.is_empty());
        assert!(empty.total.is_zero());
    }

    #[tokio::test]
    async fn test_overflowing_totals_commit_nothing() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        // written straight through the repository, past request validation
        let product = seed_product(&db, "Gold", 1, 10_000_000_000_000_000, 1000).await;
        add_line(&db, user, product.id, Quantity::from_units(999)).await;

        let err = db.checkout().commit(user, &request(None, 0.0, 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db.cart_store().get_cart(user).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(db.orders().list_paged(1).await.unwrap().meta.total, 0);
        let product = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_units(1000));
    }

    #[tokio::test]
    async fn test_records_on_an_order_cannot_be_deleted() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let customer = seed_customer(&db, "budi@mail.io").await;
        let product = seed_product(&db, "A", 600, 1000, 10).await;
        add_line(&db, user, product.id, Quantity::from_units(1)).await;
        db.checkout()
            .commit(user, &request(Some(customer), 0.0, 1000))
            .await
            .unwrap();

        let err = db.products().delete(product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        let err = db.users().delete(user).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        let err = db.customers().delete(customer).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err: ServiceError = err.into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert!(db.products().get_by_id(product.id).await.unwrap().is_some());
        assert!(db.users().get(user).await.unwrap().is_some());
        assert!(db.customers().get(customer).await.unwrap().is_some());

        // unsold rows still go
        let spare = seed_product(&db, "B", 100, 200, 1).await;
        db.products().delete(spare.id).await.unwrap();
        assert!(matches!(
            db.products().delete(spare.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invoice_is_assigned_once() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "A", 600, 1000, 10).await;
        add_line(&db, user, product.id, Quantity::from_units(1)).await;
        let order = db.checkout().commit(user, &request(None, 0.0, 1000)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let assigned = OrderRepository::assign_invoice(&mut conn, order.id, "other").await.unwrap();
        assert!(!assigned);
        drop(conn);

        let stored = db.orders().get_with_lines(order.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice, order.invoice);
    }

    // =========================================================================
    // Concurrency
    // =========================================================================

    async fn file_db(dir: &tempfile::TempDir) -> Database {
        let config = DbConfig::new(dir.path().join("tally.db")).max_connections(4);
        Database::new(config).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let ana = seed_user(&db, "ana@shop.io").await;
        let bob = seed_user(&db, "bob@shop.io").await;
        let product = seed_product(&db, "Rice", 600, 1000, 5).await;
        add_line(&db, ana, product.id, Quantity::from_units(3)).await;
        add_line(&db, bob, product.id, Quantity::from_units(3)).await;

        let ana_request = request(None, 0.0, 10_000);
        let bob_request = request(None, 0.0, 10_000);
        let ana_checkout = db.checkout();
        let bob_checkout = db.checkout();
        let (first, second) = tokio::join!(
            ana_checkout.commit(ana, &ana_request),
            bob_checkout.commit(bob, &bob_request),
        );

        let results = [first, second];
        let committed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(committed, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::OutOfStock));

        let product = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_units(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_double_submit_creates_one_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let ana = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "Rice", 600, 1000, 10).await;
        add_line(&db, ana, product.id, Quantity::from_units(2)).await;

        let submit = request(None, 0.0, 10_000);
        let checkout = db.checkout();
        let (first, second) = tokio::join!(
            checkout.commit(ana, &submit),
            checkout.commit(ana, &submit),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::EmptyCart));

        assert_eq!(db.orders().list_paged(1).await.unwrap().meta.total, 1);
        let product = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Quantity::from_units(8));
    }
}
