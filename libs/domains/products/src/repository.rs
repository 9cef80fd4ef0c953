use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductFilter, UpdateProduct};

/// Repository trait for product persistence operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: Product) -> ProductResult<Product>;
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;
    async fn update(&self, id: Uuid, update: UpdateProduct) -> ProductResult<Option<Product>>;
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64>;
    async fn get_by_supplier(
        &self,
        supplier_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> ProductResult<Vec<Product>>;

    /// Conditionally decrement stock. Returns the updated product, or `None`
    /// when the remaining quantity is below `quantity` (nothing is mutated
    /// in that case). The check and the decrement are a single atomic step.
    async fn decrement_quantity(&self, id: Uuid, quantity: i64)
        -> ProductResult<Option<Product>>;

    /// Add stock back, used to roll back partially applied order lines.
    async fn increment_quantity(&self, id: Uuid, quantity: i64) -> ProductResult<()>;

    /// Append a stored media file name to the product.
    async fn push_media(&self, id: Uuid, file_name: String) -> ProductResult<Option<Product>>;
}

/// In-memory implementation of ProductRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(supplier_id) = filter.supplier_id {
        if product.supplier_id != supplier_id {
            return false;
        }
    }
    if let Some(ref product_type) = filter.product_type {
        if &product.product_type != product_type {
            return false;
        }
    }
    if let Some(min_price) = filter.min_price {
        if product.selling_price < min_price {
            return false;
        }
    }
    if let Some(max_price) = filter.max_price {
        if product.selling_price > max_price {
            return false;
        }
    }
    if filter.in_stock == Some(true) && product.quantity <= 0 {
        return false;
    }
    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        if !product.name.to_lowercase().contains(&needle)
            && !product.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut result: Vec<Product> = products
            .values()
            .filter(|p| matches_filter(p, &filter))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn update(&self, id: Uuid, update: UpdateProduct) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;
        match products.get_mut(&id) {
            Some(product) => {
                product.apply_update(update);
                Ok(Some(product.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let mut products = self.products.write().await;
        Ok(products.remove(&id).is_some())
    }

    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| matches_filter(p, &filter)).count() as u64)
    }

    async fn get_by_supplier(
        &self,
        supplier_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> ProductResult<Vec<Product>> {
        self.list(ProductFilter {
            supplier_id: Some(supplier_id),
            limit,
            offset,
            ..Default::default()
        })
        .await
    }

    async fn decrement_quantity(
        &self,
        id: Uuid,
        quantity: i64,
    ) -> ProductResult<Option<Product>> {
        // Write lock held across check and mutation, so no oversell is possible
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(ProductError::NotFound(id))?;
        if product.quantity < quantity {
            return Ok(None);
        }
        product.quantity -= quantity;
        product.updated_at = chrono::Utc::now();
        Ok(Some(product.clone()))
    }

    async fn increment_quantity(&self, id: Uuid, quantity: i64) -> ProductResult<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(ProductError::NotFound(id))?;
        product.quantity += quantity;
        product.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn push_media(&self, id: Uuid, file_name: String) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;
        match products.get_mut(&id) {
            Some(product) => {
                product.media.push(file_name);
                product.updated_at = chrono::Utc::now();
                Ok(Some(product.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProduct;

    fn sample_product(supplier_id: Uuid, quantity: i64) -> Product {
        Product::new(
            supplier_id,
            CreateProduct {
                name: "Centrifugeuse".to_string(),
                description: "6000 rpm".to_string(),
                purchase_price: 800.0,
                selling_price: 1200.0,
                quantity,
                product_type: "centrifugeuse".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn decrement_succeeds_when_stock_covers_request() {
        let repo = InMemoryProductRepository::new();
        let product = repo
            .create(sample_product(Uuid::new_v4(), 10))
            .await
            .unwrap();

        let updated = repo.decrement_quantity(product.id, 4).await.unwrap();
        assert_eq!(updated.unwrap().quantity, 6);
    }

    #[tokio::test]
    async fn decrement_returns_none_without_mutating_on_insufficient_stock() {
        let repo = InMemoryProductRepository::new();
        let product = repo
            .create(sample_product(Uuid::new_v4(), 3))
            .await
            .unwrap();

        let result = repo.decrement_quantity(product.id, 5).await.unwrap();
        assert!(result.is_none());

        let unchanged = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, 3);
    }

    #[tokio::test]
    async fn decrement_on_missing_product_is_not_found() {
        let repo = InMemoryProductRepository::new();
        let err = repo.decrement_quantity(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(_)));
    }

    #[tokio::test]
    async fn increment_restores_stock() {
        let repo = InMemoryProductRepository::new();
        let product = repo
            .create(sample_product(Uuid::new_v4(), 5))
            .await
            .unwrap();

        repo.decrement_quantity(product.id, 5).await.unwrap();
        repo.increment_quantity(product.id, 5).await.unwrap();

        let restored = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(restored.quantity, 5);
    }

    #[tokio::test]
    async fn list_filters_by_supplier_and_stock() {
        let repo = InMemoryProductRepository::new();
        let supplier_a = Uuid::new_v4();
        let supplier_b = Uuid::new_v4();

        repo.create(sample_product(supplier_a, 10)).await.unwrap();
        repo.create(sample_product(supplier_a, 0)).await.unwrap();
        repo.create(sample_product(supplier_b, 7)).await.unwrap();

        let in_stock_for_a = repo
            .list(ProductFilter {
                supplier_id: Some(supplier_a),
                in_stock: Some(true),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(in_stock_for_a.len(), 1);
        assert_eq!(in_stock_for_a[0].supplier_id, supplier_a);
    }

    #[tokio::test]
    async fn search_matches_name_and_description() {
        let repo = InMemoryProductRepository::new();
        repo.create(sample_product(Uuid::new_v4(), 2)).await.unwrap();

        let by_description = repo
            .list(ProductFilter {
                search: Some("6000".to_string()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_description.len(), 1);

        let no_match = repo
            .list(ProductFilter {
                search: Some("spectromètre".to_string()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(no_match.is_empty());
    }
}
