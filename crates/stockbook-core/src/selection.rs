//! # Selected Products
//!
//! The working set of products picked from the product table to start a new
//! sale. Order of selection is kept; a product can only be picked once.

use crate::types::{Product, SaleFormData, SaleItemFormData};

/// Ordered, duplicate-free list of products chosen for a sale.
#[derive(Debug, Clone, Default)]
pub struct SelectedProducts {
    products: Vec<Product>,
}

impl SelectedProducts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product. Returns `false` when it was already selected.
    pub fn add(&mut self, product: Product) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Adds several products, skipping ids already present.
    pub fn extend<I: IntoIterator<Item = Product>>(&mut self, products: I) {
        for product in products {
            self.add(product);
        }
    }

    /// Removes a product by id. Returns `false` when it was not selected.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        self.products.len() != before
    }

    pub fn clear(&mut self) {
        self.products.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Initial line items: quantity 1 at the product's current price.
    pub fn to_sale_items(&self) -> Vec<SaleItemFormData> {
        self.products
            .iter()
            .map(|p| SaleItemFormData {
                product_id: p.id.clone(),
                quantity: 1,
                unit_price: p.price,
            })
            .collect()
    }

    /// Starts a sale form for a client from the current selection.
    pub fn to_sale_form(&self, client_name: impl Into<String>) -> SaleFormData {
        SaleFormData::new(client_name, self.to_sale_items())
    }
}
