//! Product catalog store
//!
//! Holds every `Product` row. Written by admin create/update actions and by
//! the stock adjustments of committed purchases and approved returns; read
//! by listing pages and the purchase flow.

use crate::types::{Product, ProductId, ShopError};
use std::collections::HashMap;

/// Manages the product catalog
///
/// Products are keyed by id. Products are never deleted in any observed
/// flow; stock reaching zero simply makes them unpurchasable.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Map of product id to product
    products: HashMap<ProductId, Product>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Catalog {
            products: HashMap::new(),
        }
    }

    /// Create or replace a product row (admin action)
    pub fn upsert(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    /// Look up a product
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    /// Look up a product, failing with `ProductNotFound`
    pub fn require(&self, id: ProductId) -> Result<&Product, ShopError> {
        self.products
            .get(&id)
            .ok_or(ShopError::ProductNotFound { product: id })
    }

    /// Mutable lookup, failing with `ProductNotFound`
    pub fn require_mut(&mut self, id: ProductId) -> Result<&mut Product, ShopError> {
        self.products
            .get_mut(&id)
            .ok_or(ShopError::ProductNotFound { product: id })
    }

    /// Remove units from stock
    ///
    /// Validates availability before mutating; a rejected removal leaves the
    /// count untouched.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` (carrying the available count) if fewer
    /// than `quantity` units remain.
    pub fn remove_stock(&mut self, id: ProductId, quantity: u32) -> Result<(), ShopError> {
        let product = self.require_mut(id)?;

        if quantity > product.stock {
            return Err(ShopError::insufficient_stock(id, product.stock, quantity));
        }

        product.stock -= quantity;
        Ok(())
    }

    /// Return units to stock
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the count cannot be represented.
    pub fn add_stock(&mut self, id: ProductId, quantity: u32) -> Result<(), ShopError> {
        let product = self.require_mut(id)?;

        let new_stock = product
            .stock
            .checked_add(quantity)
            .ok_or_else(|| ShopError::arithmetic_overflow("restock"))?;

        product.stock = new_stock;
        Ok(())
    }

    /// All products sorted by id for deterministic output
    pub fn all_sorted(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.values().collect();
        products.sort_by_key(|p| p.id);
        products
    }
}
