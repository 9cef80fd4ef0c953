//! Business logic for the product catalog

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;

/// Product service containing business logic
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a product owned by the calling supplier
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(
        &self,
        supplier_id: Uuid,
        input: CreateProduct,
    ) -> ProductResult<Product> {
        let product = Product::new(supplier_id, input);
        self.repository.create(product).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    #[instrument(skip(self))]
    pub async fn count_products(&self, filter: ProductFilter) -> ProductResult<u64> {
        self.repository.count(filter).await
    }

    #[instrument(skip(self))]
    pub async fn get_supplier_catalog(
        &self,
        supplier_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> ProductResult<Vec<Product>> {
        self.repository
            .get_by_supplier(supplier_id, limit, offset)
            .await
    }

    /// Update a product. Only the owning supplier may modify it, and the
    /// resulting prices must keep selling_price at or above purchase_price.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        supplier_id: Uuid,
        id: Uuid,
        input: UpdateProduct,
    ) -> ProductResult<Product> {
        let existing = self.get_product(id).await?;
        if existing.supplier_id != supplier_id {
            return Err(ProductError::NotOwner);
        }

        let mut preview = existing.clone();
        preview.apply_update(input.clone());
        if !preview.prices_are_consistent() {
            return Err(ProductError::Validation(
                "selling_price must be at least purchase_price".to_string(),
            ));
        }

        self.repository
            .update(id, input)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Delete a product. Only the owning supplier may remove it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, supplier_id: Uuid, id: Uuid) -> ProductResult<()> {
        let existing = self.get_product(id).await?;
        if existing.supplier_id != supplier_id {
            return Err(ProductError::NotOwner);
        }

        let deleted = self.repository.delete(id).await?;
        if !deleted {
            return Err(ProductError::NotFound(id));
        }
        Ok(())
    }

    /// Consume stock for an order line. Fails with `InsufficientStock` when
    /// the remaining quantity cannot cover the request.
    #[instrument(skip(self))]
    pub async fn consume_stock(&self, id: Uuid, quantity: i64) -> ProductResult<Product> {
        if quantity <= 0 {
            return Err(ProductError::Validation(
                "quantity must be positive".to_string(),
            ));
        }

        match self.repository.decrement_quantity(id, quantity).await? {
            Some(product) => Ok(product),
            None => {
                let current = self.get_product(id).await?;
                Err(ProductError::InsufficientStock {
                    available: current.quantity,
                    requested: quantity,
                })
            }
        }
    }

    /// Attach a stored media file name to a product owned by the supplier.
    #[instrument(skip(self))]
    pub async fn attach_media(
        &self,
        supplier_id: Uuid,
        id: Uuid,
        file_name: String,
    ) -> ProductResult<Product> {
        let existing = self.get_product(id).await?;
        if existing.supplier_id != supplier_id {
            return Err(ProductError::NotOwner);
        }

        self.repository
            .push_media(id, file_name)
            .await?
            .ok_or(ProductError::NotFound(id))
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
