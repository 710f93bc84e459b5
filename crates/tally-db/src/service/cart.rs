//! # Cart Store
//!
//! Per-user pending purchase lines.
//!
//! ## Rules
//! - A line's price is the product's sell price when the line was added
//! - Adding the same product twice creates two lines
//! - Stock is not reserved here; checkout re-checks it
//! - Only the owner may remove a line

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::ServiceResult;
use crate::repository::{CartRepository, ProductRepository};
use tally_core::checkout::subtotal;
use tally_core::input::AddCartLineInput;
use tally_core::{Cart, CartLine, CoreError, Product};

#[derive(Debug, Clone)]
pub struct CartStore {
    carts: CartRepository,
    products: ProductRepository,
}

impl CartStore {
    pub fn new(pool: SqlitePool) -> Self {
        CartStore {
            carts: CartRepository::new(pool.clone()),
            products: ProductRepository::new(pool),
        }
    }

    /// Looks up a product by scanned barcode.
    pub async fn find_product_by_barcode(&self, barcode: &str) -> ServiceResult<Product> {
        self.products
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", barcode.trim()).into())
    }

    /// Adds a line for `user_id`, freezing the current sell price.
    ///
    /// ## Returns
    /// * `Err(Validation)` - qty not in (0, 999]
    /// * `Err(NotFound)` - Unknown product
    pub async fn add_line(&self, user_id: i64, input: &AddCartLineInput) -> ServiceResult<CartLine> {
        input.validate()?;

        let product = self
            .products
            .get_by_id(input.product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", input.product_id))?;

        let line = self
            .carts
            .insert(user_id, product.id, input.qty, product.sell_price)
            .await?;

        debug!(user_id, line_id = line.id, product_id = product.id, "Cart line added");
        Ok(line)
    }

    /// Removes one of the caller's lines.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - No such line
    /// * `Err(Forbidden)` - Line belongs to another user
    pub async fn remove_line(&self, user_id: i64, line_id: i64) -> ServiceResult<()> {
        let line = self
            .carts
            .get(line_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart line", line_id))?;

        if line.user_id != user_id {
            info!(user_id, line_id, owner = line.user_id, "Refused to remove foreign cart line");
            return Err(CoreError::forbidden("cart line belongs to another user").into());
        }

        if !self.carts.delete(line_id).await? {
            return Err(CoreError::not_found("Cart line", line_id).into());
        }

        Ok(())
    }

    /// The caller's lines joined with product info, plus their total.
    pub async fn get_cart(&self, user_id: i64) -> ServiceResult<Cart> {
        let items = self.carts.items_for_user(user_id).await?;
        let total = subtotal(&items)?;
        Ok(Cart { items, total })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::service::testing::{seed_product, seed_user, test_db};
    use tally_core::{Money, Quantity};

    #[tokio::test]
    async fn test_add_line_freezes_sell_price() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "Coffee", 800, 1200, 10).await;

        let line = db
            .cart_store()
            .add_line(
                user,
                &AddCartLineInput {
                    product_id: product.id,
                    qty: Quantity::from_units(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(line.price, Money::from_cents(1200));

        // later price changes don't reach the cart
        let changed = tally_core::input::ProductInput {
            title: product.title.clone(),
            description: String::new(),
            barcode: None,
            price: product.price,
            sell_price: Money::from_cents(9999),
            stock: product.stock,
        };
        db.products().update(product.id, &changed, None).await.unwrap();

        let cart = db.cart_store().get_cart(user).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].price, Money::from_cents(1200));
        assert_eq!(cart.total, Money::from_cents(2400));
    }

    #[tokio::test]
    async fn test_same_product_twice_makes_two_lines() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "Coffee", 800, 1200, 1).await;
        let input = AddCartLineInput {
            product_id: product.id,
            qty: Quantity::from_units(5),
        };

        // no stock check when adding
        db.cart_store().add_line(user, &input).await.unwrap();
        db.cart_store().add_line(user, &input).await.unwrap();

        let cart = db.cart_store().get_cart(user).await.unwrap();
        assert_eq!(cart.items.len(), 2);
    }

    #[tokio::test]
    async fn test_add_line_rejects_bad_input() {
        let db = test_db().await;
        let user = seed_user(&db, "ana@shop.io").await;
        let product = seed_product(&db, "Coffee", 800, 1200, 10).await;

        let err = db
            .cart_store()
            .add_line(
                user,
                &AddCartLineInput {
                    product_id: product.id,
                    qty: Quantity::zero(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db
            .cart_store()
            .add_line(
                user,
                &AddCartLineInput {
                    product_id: 424242,
                    qty: Quantity::from_units(1),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_line_checks_owner() {
        let db = test_db().await;
        let ana = seed_user(&db, "ana@shop.io").await;
        let bob = seed_user(&db, "bob@shop.io").await;
        let product = seed_product(&db, "Coffee", 800, 1200, 10).await;

        let line = db
            .cart_store()
            .add_line(
                ana,
                &AddCartLineInput {
                    product_id: product.id,
                    qty: Quantity::from_units(1),
                },
            )
            .await
            .unwrap();

        let err = db.cart_store().remove_line(bob, line.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        db.cart_store().remove_line(ana, line.id).await.unwrap();

        let err = db.cart_store().remove_line(ana, line.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_find_product_by_barcode() {
        let db = test_db().await;
        let product = seed_product(&db, "Coffee", 800, 1200, 10).await;

        let found = db
            .cart_store()
            .find_product_by_barcode(&format!(" {} ", product.barcode))
            .await
            .unwrap();
        assert_eq!(found.id, product.id);

        let err = db.cart_store().find_product_by_barcode("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
