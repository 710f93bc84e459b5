//! Fixtures shared by the service tests.

use crate::repository::NewUser;
use crate::{Database, DbConfig};
use tally_core::input::{AddCartLineInput, CustomerInput, ProductInput};
use tally_core::{Money, Product, Quantity};

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Creates a Cashier named "Test User" and returns its id.
pub async fn seed_user(db: &Database, email: &str) -> i64 {
    seed_user_with_role(db, email, 2).await
}

pub async fn seed_user_with_role(db: &Database, email: &str, role_id: i64) -> i64 {
    db.users()
        .create(NewUser {
            first_name: "Test",
            last_name: "User",
            email,
            password_hash: "not-a-real-hash",
            role_id,
        })
        .await
        .unwrap()
        .id
}

pub async fn seed_customer(db: &Database, email: &str) -> i64 {
    db.customers()
        .create(&CustomerInput {
            name: "Customer".to_string(),
            email: email.to_string(),
        })
        .await
        .unwrap()
        .id
}

pub async fn seed_product(db: &Database, title: &str, cost: i64, sell: i64, stock: i64) -> Product {
    db.products()
        .insert(
            &ProductInput {
                title: title.to_string(),
                description: String::new(),
                barcode: None,
                price: Money::from_cents(cost),
                sell_price: Money::from_cents(sell),
                stock: Quantity::from_units(stock),
            },
            None,
        )
        .await
        .unwrap()
}

pub async fn add_line(db: &Database, user_id: i64, product_id: i64, qty: Quantity) {
    db.cart_store()
        .add_line(user_id, &AddCartLineInput { product_id, qty })
        .await
        .unwrap();
}
