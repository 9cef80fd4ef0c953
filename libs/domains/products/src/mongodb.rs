//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            // Supplier catalog listing
            IndexModel::builder()
                .keys(doc! { "supplier_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_supplier".to_string())
                        .build(),
                )
                .build(),
            // Category listing
            IndexModel::builder()
                .keys(doc! { "product_type": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_product_type".to_string())
                        .build(),
                )
                .build(),
            // Price range queries
            IndexModel::builder()
                .keys(doc! { "selling_price": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_selling_price".to_string())
                        .build(),
                )
                .build(),
            // Text search on name and description
            IndexModel::builder()
                .keys(doc! { "name": "text", "description": "text" })
                .options(
                    IndexOptions::builder()
                        .name("idx_text_search".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> mongodb::bson::Document {
        let mut doc = doc! {};

        if let Some(supplier_id) = filter.supplier_id {
            doc.insert("supplier_id", to_bson(&supplier_id).unwrap_or(Bson::Null));
        }

        if let Some(ref product_type) = filter.product_type {
            doc.insert("product_type", product_type);
        }

        // Price range
        if filter.min_price.is_some() || filter.max_price.is_some() {
            let mut price_filter = doc! {};
            if let Some(min) = filter.min_price {
                price_filter.insert("$gte", min);
            }
            if let Some(max) = filter.max_price {
                price_filter.insert("$lte", max);
            }
            doc.insert("selling_price", price_filter);
        }

        if filter.in_stock == Some(true) {
            doc.insert("quantity", doc! { "$gt": 0 });
        }

        if let Some(ref search) = filter.search {
            doc.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": search, "$options": "i" } },
                    doc! { "description": { "$regex": search, "$options": "i" } },
                ],
            );
        }

        doc
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let product = self.collection.find_one(filter).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        use futures::TryStreamExt;

        let mongo_filter = Self::build_filter(&filter);

        let options = mongodb::options::FindOptions::builder()
            .limit(filter.limit)
            .skip(filter.offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: Uuid, update: UpdateProduct) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let existing = self.collection.find_one(filter.clone()).await?;

        let Some(mut product) = existing else {
            return Ok(None);
        };
        product.apply_update(update);

        self.collection.replace_one(filter, &product).await?;

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(Some(product))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let result = self.collection.delete_one(filter).await?;

        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let mongo_filter = Self::build_filter(&filter);
        let count = self.collection.count_documents(mongo_filter).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
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

    #[instrument(skip(self))]
    async fn decrement_quantity(
        &self,
        id: Uuid,
        quantity: i64,
    ) -> ProductResult<Option<Product>> {
        // Single conditional update: the quantity guard and the $inc execute
        // atomically on the server, so concurrent orders cannot oversell.
        let filter = doc! {
            "_id": to_bson(&id).unwrap_or(Bson::Null),
            "quantity": { "$gte": quantity },
        };
        let update = doc! {
            "$inc": { "quantity": -quantity },
            "$set": { "updated_at": chrono::Utc::now().to_rfc3339() },
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        match updated {
            Some(product) => {
                tracing::info!(product_id = %id, quantity, "Stock decremented");
                Ok(Some(product))
            }
            None => {
                // Distinguish a missing product from insufficient stock
                if self.get_by_id(id).await?.is_none() {
                    return Err(ProductError::NotFound(id));
                }
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn increment_quantity(&self, id: Uuid, quantity: i64) -> ProductResult<()> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = doc! {
            "$inc": { "quantity": quantity },
            "$set": { "updated_at": chrono::Utc::now().to_rfc3339() },
        };

        let result = self.collection.update_one(filter, update).await?;
        if result.matched_count == 0 {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, quantity, "Stock restored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn push_media(&self, id: Uuid, file_name: String) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = doc! {
            "$push": { "media": &file_name },
            "$set": { "updated_at": chrono::Utc::now().to_rfc3339() },
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_empty() {
        let filter = ProductFilter::default();
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_with_supplier() {
        let filter = ProductFilter {
            supplier_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.contains_key("supplier_id"));
    }

    #[test]
    fn test_build_filter_with_product_type() {
        let filter = ProductFilter {
            product_type: Some("microscope".to_string()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.contains_key("product_type"));
    }

    #[test]
    fn test_build_filter_with_price_range() {
        let filter = ProductFilter {
            min_price: Some(100.0),
            max_price: Some(5000.0),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.contains_key("selling_price"));
    }

    #[test]
    fn test_build_filter_in_stock() {
        let filter = ProductFilter {
            in_stock: Some(true),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.contains_key("quantity"));
    }

    #[test]
    fn test_build_filter_with_search() {
        let filter = ProductFilter {
            search: Some("microscope".to_string()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.contains_key("$or"));
    }
}
