//! # Product Catalog
//!
//! Product CRUD together with the product image in object storage.
//!
//! ## Image Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create:  put(image) ──► INSERT ──(fails)──► delete(image), warn        │
//! │  update:  put(new)   ──► UPDATE ──(ok)──► delete(old)                   │
//! │                             └────(fails)──► delete(new), warn           │
//! │  delete:  DELETE row ──► delete(image), warn on failure                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The row is the source of truth. A leaked file is logged, never an error.

use std::sync::Arc;

use tally_core::input::ProductInput;
use tally_core::Product;
use tally_db::ProductRepository;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::storage::ObjectStore;

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Clone)]
pub struct Catalog {
    products: ProductRepository,
    store: Arc<dyn ObjectStore>,
}

impl Catalog {
    pub fn new(products: ProductRepository, store: Arc<dyn ObjectStore>) -> Self {
        Catalog { products, store }
    }

    /// Stores the image (if any), then inserts the product.
    pub async fn create(&self, input: ProductInput, image: Option<ImageUpload>) -> ApiResult<Product> {
        let input = input.validate()?;

        let image_url = match image {
            Some(image) => Some(self.store.put(image.bytes, &image.content_type).await?),
            None => None,
        };

        match self.products.insert(&input, image_url.as_deref()).await {
            Ok(product) => {
                info!(product_id = product.id, barcode = %product.barcode, "Product created");
                Ok(product)
            }
            Err(e) => {
                if let Some(url) = image_url {
                    self.discard(&url).await;
                }
                Err(e.into())
            }
        }
    }

    /// Updates product fields and, when a new image is given, swaps it in.
    pub async fn update(
        &self,
        id: i64,
        input: ProductInput,
        image: Option<ImageUpload>,
    ) -> ApiResult<Product> {
        let input = input.validate()?;

        let existing = self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| tally_db::DbError::not_found("Product", id))?;

        let new_url = match image {
            Some(image) => Some(self.store.put(image.bytes, &image.content_type).await?),
            None => None,
        };

        let result = self.products.update(id, &input, new_url.as_deref()).await;

        let product = match result {
            Ok(product) => product,
            Err(e) => {
                if let Some(url) = &new_url {
                    self.discard(url).await;
                }
                return Err(e.into());
            }
        };

        if new_url.is_some() {
            if let Some(old) = existing.image_url.as_deref() {
                self.discard(old).await;
            }
        }

        info!(product_id = id, "Product updated");
        Ok(product)
    }

    /// Deletes the product row, then its image.
    pub async fn delete(&self, id: i64) -> ApiResult<Product> {
        let product = self.products.delete(id).await?;

        if let Some(url) = product.image_url.as_deref() {
            self.discard(url).await;
        }

        info!(product_id = id, "Product deleted");
        Ok(product)
    }

    async fn discard(&self, url: &str) {
        if let Err(e) = self.store.delete(url).await {
            warn!(%url, error = %e, "Failed to delete product image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::storage::LocalObjectStore;
    use tally_core::{Money, Quantity};
    use tally_db::{Database, DbConfig};

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

    fn png() -> Option<ImageUpload> {
        Some(ImageUpload {
            bytes: b"fake-png".to_vec(),
            content_type: "image/png".to_string(),
        })
    }

    async fn setup() -> (Catalog, Arc<LocalObjectStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = Arc::new(LocalObjectStore::new(dir.path()));
        (Catalog::new(db.products(), store.clone()), store, dir)
    }

    #[tokio::test]
    async fn test_image_follows_product_lifecycle() {
        let (catalog, store, _dir) = setup().await;

        let product = catalog.create(input("Coffee", None), png()).await.unwrap();
        let first = product.image_url.clone().unwrap();
        assert!(store.get(&first).await.is_ok());

        let product = catalog
            .update(product.id, input("Coffee 250g", None), png())
            .await
            .unwrap();
        let second = product.image_url.clone().unwrap();
        assert_ne!(first, second);
        assert!(store.get(&first).await.is_err());
        assert!(store.get(&second).await.is_ok());

        // no image keeps the current one
        let product = catalog
            .update(product.id, input("Coffee 250g", None), None)
            .await
            .unwrap();
        assert_eq!(product.image_url.as_deref(), Some(second.as_str()));

        catalog.delete(product.id).await.unwrap();
        assert!(store.get(&second).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_insert_discards_upload() {
        let (catalog, store, _dir) = setup().await;

        catalog.create(input("Coffee", Some("111")), None).await.unwrap();
        let err = catalog.create(input("Tea", Some("111")), png()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let mut entries = tokio::fs::read_dir(store.root()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_update_keeps_current_image() {
        let (catalog, store, _dir) = setup().await;

        catalog.create(input("Tea", Some("222")), None).await.unwrap();
        let product = catalog.create(input("Coffee", Some("111")), png()).await.unwrap();
        let current = product.image_url.clone().unwrap();

        let err = catalog
            .update(product.id, input("Coffee", Some("222")), png())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let stored = catalog.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.image_url.as_deref(), Some(current.as_str()));
        assert_eq!(stored.barcode, "111");
        assert!(store.get(&current).await.is_ok());

        // only the original upload is left on disk
        let mut entries = tokio::fs::read_dir(store.root()).await.unwrap();
        let mut files = 0;
        while entries.next_entry().await.unwrap().is_some() {
            files += 1;
        }
        assert_eq!(files, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_product() {
        let (catalog, _store, _dir) = setup().await;
        let err = catalog.update(999, input("Ghost", None), png()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
