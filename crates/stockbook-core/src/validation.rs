//! # Validation Module
//!
//! Form validation for products and sales.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Field validators (this module)                               │
//! │  ├── validate_required / validate_price / validate_quantity ...         │
//! │  └── One field, one rule, one ValidationError                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Form validators (this module)                                │
//! │  ├── validate_product_form / validate_sale_form                         │
//! │  └── Collect every failing field into FieldErrors                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST backend                                                 │
//! │  └── Final authority, rejects with an HTTP error + message              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Form Keys
//! Product errors are keyed by field name (`"price"`). Sale line-item errors
//! are keyed by field plus line index (`"productId0"`, `"quantity1"`,
//! `"price2"`) so each row can show its own message.
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_price, validate_quantity};
//! use stockbook_core::Money;
//!
//! assert!(validate_price(Money::from_cents(999)).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::{FieldErrors, ValidationError};
use crate::money::Money;
use crate::types::{Category, ProductFormData, ProductStatus, SaleFormData, SaleItemFormData};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a text field is not blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a product price.
///
/// ## Rules
/// - Must be strictly positive (a free product is a data-entry mistake)
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_price;
/// use stockbook_core::Money;
///
/// assert!(validate_price(Money::from_cents(1)).is_ok());
/// assert!(validate_price(Money::zero()).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a stock level (zero is allowed).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

/// Validates a line-item quantity (must be at least 1).
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a line-item unit price (zero is allowed for giveaways).
pub fn validate_unit_price(unit_price: Money) -> ValidationResult<()> {
    if unit_price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unitPrice".to_string(),
        });
    }
    Ok(())
}

/// Validates a category against the fixed list.
pub fn validate_category(category: &str) -> ValidationResult<Category> {
    validate_required("category", category)?;
    category.parse()
}

/// Validates a status against the fixed list.
pub fn validate_status(status: &str) -> ValidationResult<ProductStatus> {
    validate_required("status", status)?;
    status.parse()
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates a product form, collecting every failing field.
///
/// On success returns the form with its category lower-cased, which is the
/// form the backend stores.
pub fn validate_product_form(form: &ProductFormData) -> Result<ProductFormData, FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.check("name", validate_required("name", &form.name));
    errors.check("price", validate_price(form.price));
    errors.check("description", validate_required("description", &form.description));
    errors.check("category", validate_category(&form.category).map(|_| ()));
    errors.check("platformId", validate_required("platformId", &form.platform_id));
    errors.check("stock", validate_stock(form.stock));
    errors.check("status", validate_status(&form.status).map(|_| ()));
    errors.check("internCode", validate_required("internCode", &form.intern_code));

    errors.into_result()?;

    let mut normalized = form.clone();
    normalized.category = form.category.trim().to_lowercase();
    Ok(normalized)
}

/// Validates a sale form, collecting every failing field.
///
/// On success returns the form with `total` recomputed from the items, so a
/// stale total typed by the user never reaches the backend.
pub fn validate_sale_form(form: &SaleFormData) -> Result<SaleFormData, FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.check("clientName", validate_required("clientName", &form.client_name));

    for (idx, item) in form.products.iter().enumerate() {
        errors.check(
            format!("productId{idx}"),
            validate_required("productId", &item.product_id),
        );
        errors.check(
            format!("quantity{idx}"),
            validate_quantity(item.quantity).and_then(|()| validate_line_total(item)),
        );
        errors.check(format!("price{idx}"), validate_unit_price(item.unit_price));
    }

    errors.into_result()?;

    let mut normalized = form.clone();
    normalized.total = checked_sale_total(form).ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.push(
            "total",
            ValidationError::TooLarge {
                field: "total".to_string(),
            },
        );
        errors
    })?;
    Ok(normalized)
}

fn validate_line_total(item: &SaleItemFormData) -> ValidationResult<()> {
    match item.unit_price.checked_multiply_quantity(item.quantity) {
        Some(_) => Ok(()),
        None => Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
        }),
    }
}

fn checked_sale_total(form: &SaleFormData) -> Option<Money> {
    form.products.iter().try_fold(Money::zero(), |total, item| {
        total.checked_add(item.unit_price.checked_multiply_quantity(item.quantity)?)
    })
}

/// Σ quantity × unit price over the items of a sale form.
pub fn sale_total(form: &SaleFormData) -> Money {
    form.products.iter().map(|item| item.line_total()).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
