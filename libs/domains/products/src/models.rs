use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product entity - a catalog item owned by exactly one supplier
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Product description
    #[serde(default)]
    pub description: String,
    /// What the supplier paid for the item
    pub purchase_price: f64,
    /// Price charged to clients; never below purchase_price
    pub selling_price: f64,
    /// Units currently in stock
    pub quantity: i64,
    /// Free-form equipment category (e.g. "microscope", "centrifugeuse")
    pub product_type: String,
    /// Owning supplier
    pub supplier_id: Uuid,
    /// Stored media file names (photos/videos)
    #[serde(default)]
    pub media: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_prices"))]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub purchase_price: f64,
    #[validate(range(min = 0.0))]
    pub selling_price: f64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i64,
    #[validate(length(min = 1, max = 100))]
    pub product_type: String,
}

/// DTO for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub purchase_price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub selling_price: Option<f64>,
    #[validate(range(min = 0))]
    pub quantity: Option<i64>,
    #[validate(length(min = 1, max = 100))]
    pub product_type: Option<String>,
}

/// Query filters for listing products
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    /// Filter by owning supplier
    pub supplier_id: Option<Uuid>,
    /// Filter by equipment category
    pub product_type: Option<String>,
    /// Minimum selling price
    pub min_price: Option<f64>,
    /// Maximum selling price
    pub max_price: Option<f64>,
    /// Only show products with stock remaining
    pub in_stock: Option<bool>,
    /// Search in name and description
    pub search: Option<String>,
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}

fn validate_prices(input: &CreateProduct) -> Result<(), ValidationError> {
    if input.selling_price < input.purchase_price {
        return Err(ValidationError::new("selling_below_purchase")
            .with_message("selling_price must be at least purchase_price".into()));
    }
    Ok(())
}

impl Product {
    /// Create a new product owned by `supplier_id` from a CreateProduct DTO
    pub fn new(supplier_id: Uuid, input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            purchase_price: input.purchase_price,
            selling_price: input.selling_price,
            quantity: input.quantity,
            product_type: input.product_type,
            supplier_id,
            media: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(purchase_price) = update.purchase_price {
            self.purchase_price = purchase_price;
        }
        if let Some(selling_price) = update.selling_price {
            self.selling_price = selling_price;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(product_type) = update.product_type {
            self.product_type = product_type;
        }
        self.updated_at = Utc::now();
    }

    /// Margin invariant after an update; updates can change either price.
    pub fn prices_are_consistent(&self) -> bool {
        self.selling_price >= self.purchase_price
    }

    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> CreateProduct {
        CreateProduct {
            name: "Microscope optique".to_string(),
            description: "Grossissement x1000".to_string(),
            purchase_price: 300.0,
            selling_price: 500.0,
            quantity: 10,
            product_type: "microscope".to_string(),
        }
    }

    #[test]
    fn create_validates_margin() {
        let valid = create_input();
        assert!(valid.validate().is_ok());

        let inverted = CreateProduct {
            selling_price: 200.0,
            ..create_input()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn new_product_is_owned_by_supplier() {
        let supplier = Uuid::new_v4();
        let product = Product::new(supplier, create_input());

        assert_eq!(product.supplier_id, supplier);
        assert_eq!(product.quantity, 10);
        assert!(product.is_in_stock());
        assert!(product.prices_are_consistent());
    }

    #[test]
    fn apply_update_changes_only_provided_fields() {
        let mut product = Product::new(Uuid::new_v4(), create_input());
        let original_name = product.name.clone();

        product.apply_update(UpdateProduct {
            selling_price: Some(550.0),
            ..Default::default()
        });

        assert_eq!(product.name, original_name);
        assert_eq!(product.selling_price, 550.0);
        assert_eq!(product.purchase_price, 300.0);
    }

    #[test]
    fn update_can_break_margin_and_is_caught_by_consistency_check() {
        let mut product = Product::new(Uuid::new_v4(), create_input());
        product.apply_update(UpdateProduct {
            selling_price: Some(100.0),
            ..Default::default()
        });
        assert!(!product.prices_are_consistent());
    }
}
