//! # stockbook-core: Pure Inventory Logic for Stockbook
//!
//! Everything the back office knows about products and sales that does not
//! need a network or a disk: wire types, money, form rules, CSV text, table
//! ordering.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stockbook-cli (views)                        │   │
//! │  │    products ──► sales ──► sales export ──► backup               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           stockbook-query (REST client + cache)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockbook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │validation│ │ export  │ │ listing │ │   │
//! │  │   │ Product │ │  Money  │ │  forms   │ │   CSV   │ │ sort /  │ │   │
//! │  │   │  Sale   │ │         │ │          │ │         │ │  pages  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCKS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire types (Product, Sale, Platform, form payloads)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Product and sale form rules
//! - [`export`] - Records → CSV text
//! - [`selection`] - Products picked for a new sale
//! - [`listing`] - Table sorting and pagination
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::export::{to_csv, to_records};
//! use stockbook_core::{Money, Platform};
//!
//! let platforms = vec![Platform {
//!     id: "n64".into(),
//!     name: "Nintendo 64".into(),
//!     manufacturer: Some("Nintendo".into()),
//!     release_year: Some(1996),
//!     compatible_with: None,
//!     region: None,
//! }];
//!
//! let csv = to_csv(&to_records(&platforms).unwrap(), "Plataformas");
//! assert!(csv.starts_with("# Plataformas\n_id,name,manufacturer,releaseYear\n"));
//! assert_eq!(Money::from_cents(1099).to_string(), "10.99");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod listing;
pub mod money;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FieldErrors, ValidationError};
pub use export::Record;
pub use money::Money;
pub use selection::SelectedProducts;
pub use types::*;
