//! Catalog product types
//!
//! A product is created and updated only by admin actions; the purchase and
//! return flows adjust its stock count but never remove it.

use rust_decimal::Decimal;

/// Product identifier
///
/// Supports product IDs from 0 to 4,294,967,295
pub type ProductId = u32;

/// A purchasable catalog entry
///
/// Invariant: `stock` never goes negative. Stock is adjusted only inside a
/// committed purchase or an approved return, always by a unit quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// The product ID
    pub id: ProductId,

    /// Display name, used in receipts and listings
    pub name: String,

    /// Free-text description
    pub description: String,

    /// Unit price (positive)
    pub price: Decimal,

    /// Remaining purchasable units
    pub stock: u32,

    /// Opaque reference to the product image, handled by external storage
    pub image: Option<String>,
}

impl Product {
    /// Create a product with an empty description and no image
    pub fn new(id: ProductId, name: &str, price: Decimal, stock: u32) -> Self {
        Product {
            id,
            name: name.to_string(),
            description: String::new(),
            price,
            stock,
            image: None,
        }
    }
}
