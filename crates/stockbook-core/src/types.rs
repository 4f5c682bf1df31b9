//! # Domain Types
//!
//! Wire types exchanged with the REST backend and rendered by the views.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Platform     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  _id            │   │  _id            │   │  _id            │       │
//! │  │  name, price    │   │  date, total    │   │  name           │       │
//! │  │  category       │   │  products[] ────┼─► │  manufacturer?  │       │
//! │  │  platformId ────┼─► │  extra {..}     │   │  releaseYear?   │       │
//! │  │  stock, status  │   └────────┬────────┘   └─────────────────┘       │
//! │  └─────────────────┘            │                                       │
//! │           ▲            ┌────────▼────────┐                              │
//! │           └────────────│    SaleItem     │                              │
//! │             productId  │  quantity       │                              │
//! │                        │  unitPrice      │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Conventions
//! - Identifiers are the backend's `_id` strings (opaque, not UUIDs)
//! - Field names are camelCase
//! - Amounts are decimal numbers on the wire, [`Money`] in memory

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Entity Kind
// =============================================================================

/// The REST resources the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Products,
    Sales,
    Platforms,
}

impl EntityKind {
    /// Path segment of the collection on the backend.
    ///
    /// Platforms live under the singular `/platform`.
    pub const fn path_segment(&self) -> &'static str {
        match self {
            EntityKind::Products => "products",
            EntityKind::Sales => "sales",
            EntityKind::Platforms => "platform",
        }
    }

    /// Collection path, e.g. `/products`.
    pub fn collection_path(&self) -> String {
        format!("/{}", self.path_segment())
    }

    /// Entity path, e.g. `/products/abc123`.
    ///
    /// The id is percent-encoded so it always stays one path segment.
    pub fn entity_path(&self, id: &str) -> String {
        format!("/{}/{}", self.path_segment(), urlencoding::encode(id))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// An entity the query layer can fetch and cache.
pub trait Resource {
    /// The backend collection this entity lives in.
    const KIND: EntityKind;

    /// The backend identifier.
    fn id(&self) -> &str;
}

// =============================================================================
// Product
// =============================================================================

/// A product in the inventory.
///
/// Like [`Sale`], fields the backend adds beyond these (`__v`, timestamps...)
/// are kept in `extra` and written back after the typed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Backend identifier.
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit price.
    #[ts(type = "number")]
    pub price: Money,

    pub description: String,

    /// Optional product picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// One of [`Category`] (kept as text, the backend does not enforce it).
    pub category: String,

    /// Reference to a [`Platform`].
    pub platform_id: String,

    /// Units on hand.
    #[serde(default)]
    pub stock: i64,

    /// One of [`ProductStatus`].
    pub status: String,

    /// Internal stock code.
    pub intern_code: String,

    /// Fields not modelled above.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Resource for Product {
    const KIND: EntityKind = EntityKind::Products;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create/update payload for a product (a [`Product`] without `_id`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductFormData {
    pub name: String,
    #[ts(type = "number")]
    pub price: Money,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub category: String,
    pub platform_id: String,
    pub stock: i64,
    pub status: String,
    pub intern_code: String,
}

impl From<&Product> for ProductFormData {
    fn from(p: &Product) -> Self {
        ProductFormData {
            name: p.name.clone(),
            price: p.price,
            description: p.description.clone(),
            image_url: p.image_url.clone(),
            category: p.category.clone(),
            platform_id: p.platform_id.clone(),
            stock: p.stock,
            status: p.status.clone(),
            intern_code: p.intern_code.clone(),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// ## Extension Fields
/// The backend attaches fields the views never declared (`clientName`,
/// `__v`, timestamps...). They are kept in `extra`, an insertion-ordered map,
/// so re-serializing a sale (e.g. for CSV export) emits the typed fields first
/// and the unknown ones after them, always in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    #[serde(rename = "_id")]
    pub id: String,

    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    #[ts(type = "number")]
    pub total: Money,

    /// Line items.
    #[serde(default)]
    pub products: Vec<SaleItem>,

    /// Fields not modelled above.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Sale {
    /// Product ids referenced by the line items, in line order.
    pub fn product_ids(&self) -> Vec<String> {
        self.products.iter().map(|item| item.product_id.clone()).collect()
    }

    /// Client name, when the backend sent one.
    pub fn client_name(&self) -> Option<&str> {
        self.extra.get("clientName").and_then(|v| v.as_str())
    }
}

impl Resource for Sale {
    const KIND: EntityKind = EntityKind::Sales;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A line item of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub unit_price: Money,
}

impl SaleItem {
    /// unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Create/update payload for a sale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleFormData {
    #[ts(type = "number")]
    pub total: Money,
    pub client_name: String,
    pub products: Vec<SaleItemFormData>,
}

impl SaleFormData {
    /// Builds a payload whose total is derived from the items.
    pub fn new(client_name: impl Into<String>, products: Vec<SaleItemFormData>) -> Self {
        let total = products.iter().map(SaleItemFormData::line_total).sum();
        SaleFormData {
            total,
            client_name: client_name.into(),
            products,
        }
    }
}

/// One line of a sale being created.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItemFormData {
    pub product_id: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub unit_price: Money,
}

impl SaleItemFormData {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Platform
// =============================================================================

/// A gaming platform a product belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Platform {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_with: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Resource for Platform {
    const KIND: EntityKind = EntityKind::Platforms;

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Fixed Option Lists
// =============================================================================

/// Product categories offered by the product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    #[serde(rename = "juegos")]
    Games,
    #[serde(rename = "consolas")]
    Consoles,
    #[serde(rename = "accessorios")]
    Accessories,
    #[serde(rename = "merchandising")]
    Merchandise,
    #[serde(rename = "otros")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Games,
        Category::Consoles,
        Category::Accessories,
        Category::Merchandise,
        Category::Other,
    ];

    /// Value stored on the product.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Games => "juegos",
            Category::Consoles => "consolas",
            Category::Accessories => "accessorios",
            Category::Merchandise => "merchandising",
            Category::Other => "otros",
        }
    }

    fn allowed() -> Vec<String> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// Case-insensitive: the form lower-cases categories before submitting.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Self::allowed(),
            })
    }
}

/// Product condition offered by the product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ProductStatus {
    #[serde(rename = "nuevo")]
    New,
    #[serde(rename = "usado")]
    Used,
    #[serde(rename = "reacondicionado")]
    Refurbished,
    #[serde(rename = "loose")]
    Loose,
    #[serde(rename = "CIB")]
    CompleteInBox,
    #[serde(rename = "gameManual")]
    GameManual,
    #[serde(rename = "gameBox")]
    GameBox,
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "box")]
    Box,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 9] = [
        ProductStatus::New,
        ProductStatus::Used,
        ProductStatus::Refurbished,
        ProductStatus::Loose,
        ProductStatus::CompleteInBox,
        ProductStatus::GameManual,
        ProductStatus::GameBox,
        ProductStatus::Manual,
        ProductStatus::Box,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::New => "nuevo",
            ProductStatus::Used => "usado",
            ProductStatus::Refurbished => "reacondicionado",
            ProductStatus::Loose => "loose",
            ProductStatus::CompleteInBox => "CIB",
            ProductStatus::GameManual => "gameManual",
            ProductStatus::GameBox => "gameBox",
            ProductStatus::Manual => "manual",
            ProductStatus::Box => "box",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    /// Exact match: status values are mixed-case (`CIB`, `gameBox`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == trimmed)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: Self::ALL.iter().map(|st| st.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_paths() {
        assert_eq!(EntityKind::Products.collection_path(), "/products");
        assert_eq!(EntityKind::Sales.entity_path("s1"), "/sales/s1");
        assert_eq!(EntityKind::Platforms.collection_path(), "/platform");
    }

    #[test]
    fn test_entity_path_encodes_id() {
        assert_eq!(
            EntityKind::Products.entity_path("a/b?c#d"),
            "/products/a%2Fb%3Fc%23d"
        );
        assert_eq!(EntityKind::Sales.entity_path("caja 1"), "/sales/caja%201");
    }

    #[test]
    fn test_product_wire_format() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Zelda",
            "price": 59.99,
            "description": "Cartridge",
            "category": "juegos",
            "platformId": "n64",
            "stock": 3,
            "status": "usado",
            "internCode": "Z-64"
        }))
        .unwrap();

        assert_eq!(product.id, "p1");
        assert_eq!(product.price.cents(), 5999);
        assert_eq!(product.image_url, None);

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["_id"], "p1");
        assert_eq!(value["platformId"], "n64");
        assert_eq!(value["internCode"], "Z-64");
        assert!(value.get("imageUrl").is_none());
    }

    #[test]
    fn test_product_keeps_extension_fields() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Zelda",
            "price": 59.99,
            "description": "Cartridge",
            "category": "juegos",
            "platformId": "n64",
            "stock": 3,
            "status": "usado",
            "internCode": "Z-64",
            "__v": 0,
            "createdAt": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(product.extra["__v"], 0);
        let value = serde_json::to_value(&product).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys[keys.len() - 2..], ["__v", "createdAt"]);
        assert_eq!(value["createdAt"], "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_sale_keeps_extension_fields_in_order() {
        let sale: Sale = serde_json::from_value(json!({
            "_id": "s1",
            "date": "2024-05-01T10:00:00Z",
            "total": 120,
            "clientName": "Ana",
            "products": [
                { "_id": "i1", "saleId": "s1", "productId": "p1", "quantity": 2, "unitPrice": 60 }
            ],
            "__v": 0
        }))
        .unwrap();

        assert_eq!(sale.client_name(), Some("Ana"));
        assert_eq!(sale.product_ids(), vec!["p1".to_string()]);
        assert_eq!(sale.products[0].line_total().cents(), 12000);

        let keys: Vec<String> = serde_json::to_value(&sale)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["_id", "date", "total", "products", "clientName", "__v"]);
    }

    #[test]
    fn test_sale_form_total() {
        let form = SaleFormData::new(
            "Ana",
            vec![
                SaleItemFormData {
                    product_id: "p1".into(),
                    quantity: 2,
                    unit_price: Money::from_cents(1050),
                },
                SaleItemFormData {
                    product_id: "p2".into(),
                    quantity: 1,
                    unit_price: Money::from_cents(999),
                },
            ],
        );
        assert_eq!(form.total.cents(), 3099);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Juegos".parse::<Category>().unwrap(), Category::Games);
        assert_eq!("otros".parse::<Category>().unwrap(), Category::Other);
        assert!("food".parse::<Category>().is_err());
    }

    #[test]
    fn test_status_parsing_is_exact() {
        assert_eq!("CIB".parse::<ProductStatus>().unwrap(), ProductStatus::CompleteInBox);
        assert!("cib".parse::<ProductStatus>().is_err());
    }
}
