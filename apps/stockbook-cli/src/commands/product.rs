//! # Product Commands
//!
//! Product table, product detail, and the create/edit/delete forms.
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products edit p1 --price 45 --stock 2                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch_one::<Product>("p1")          (cache hit when fresh)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductFormData::from(&product) + flag overrides                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  update_product ── invalid ──► ViewError::validation (no request)       │
//! │       │ ok                                                              │
//! │       ▼                                                                 │
//! │  PUT /products/p1 ──► every cached product entry goes stale             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::{Args, Subcommand};
use stockbook_core::export::{to_record, to_records};
use stockbook_core::{Money, Product, ProductFormData};
use tracing::{debug, info};

use super::{created_id, render_detail, render_listing, ListArgs};
use crate::error::ViewError;
use crate::state::{ClientState, ConfigState};

const COLUMNS: &[&str] = &[
    "_id",
    "name",
    "price",
    "category",
    "platformId",
    "stock",
    "status",
    "internCode",
];

#[derive(Debug, Clone, Subcommand)]
pub enum ProductCommand {
    /// Product table
    List(ListArgs),

    /// One product
    Show { id: String },

    /// Create a product
    Add(NewProductArgs),

    /// Change some fields of a product
    Edit(EditProductArgs),

    /// Delete a product
    Delete { id: String },
}

/// Every field of the product form.
#[derive(Debug, Clone, Args)]
pub struct NewProductArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub price: Money,
    #[arg(long)]
    pub description: String,
    /// One of juegos, consolas, accessorios, merchandising, otros
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub platform_id: String,
    #[arg(long, default_value_t = 0)]
    pub stock: i64,
    /// One of nuevo, usado, reacondicionado, loose, CIB, gameManual, gameBox, manual, box
    #[arg(long)]
    pub status: String,
    #[arg(long)]
    pub intern_code: String,
    #[arg(long)]
    pub image_url: Option<String>,
}

impl From<NewProductArgs> for ProductFormData {
    fn from(args: NewProductArgs) -> Self {
        ProductFormData {
            name: args.name,
            price: args.price,
            description: args.description,
            image_url: args.image_url,
            category: args.category,
            platform_id: args.platform_id,
            stock: args.stock,
            status: args.status,
            intern_code: args.intern_code,
        }
    }
}

/// Fields left out keep their current value.
#[derive(Debug, Clone, Args)]
pub struct EditProductArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub price: Option<Money>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub platform_id: Option<String>,
    #[arg(long)]
    pub stock: Option<i64>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub intern_code: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
}

impl EditProductArgs {
    fn apply(self, form: &mut ProductFormData) {
        if let Some(v) = self.name {
            form.name = v;
        }
        if let Some(v) = self.price {
            form.price = v;
        }
        if let Some(v) = self.description {
            form.description = v;
        }
        if let Some(v) = self.category {
            form.category = v;
        }
        if let Some(v) = self.platform_id {
            form.platform_id = v;
        }
        if let Some(v) = self.stock {
            form.stock = v;
        }
        if let Some(v) = self.status {
            form.status = v;
        }
        if let Some(v) = self.intern_code {
            form.intern_code = v;
        }
        if self.image_url.is_some() {
            form.image_url = self.image_url;
        }
    }
}

pub async fn run(
    client: &ClientState,
    config: &ConfigState,
    command: ProductCommand,
) -> Result<String, ViewError> {
    match command {
        ProductCommand::List(args) => list_products(client, config, &args).await,
        ProductCommand::Show { id } => show_product(client, &id).await,
        ProductCommand::Add(args) => add_product(client, args).await,
        ProductCommand::Edit(args) => edit_product(client, args).await,
        ProductCommand::Delete { id } => delete_product(client, &id).await,
    }
}

/// Renders the product table.
pub async fn list_products(
    client: &ClientState,
    config: &ConfigState,
    args: &ListArgs,
) -> Result<String, ViewError> {
    let products: Vec<Product> = client.inner().fetch_many().await?;
    debug!(count = products.len(), "Listing products");

    let records = to_records(&products)?;
    Ok(render_listing(
        records,
        COLUMNS,
        args,
        config.page_size,
        "products",
    ))
}

pub async fn show_product(client: &ClientState, id: &str) -> Result<String, ViewError> {
    let product: Product = client
        .inner()
        .fetch_one(id)
        .await
        .map_err(|e| ViewError::from_lookup("Product", id, e))?;

    Ok(render_detail(&to_record(&product)?))
}

pub async fn add_product(client: &ClientState, args: NewProductArgs) -> Result<String, ViewError> {
    let form = ProductFormData::from(args);
    let response = client.inner().create_product(&form).await?;

    info!(name = %form.name, "Product created");
    Ok(match created_id(&response) {
        Some(id) => format!("Created product {} ({})", form.name, id),
        None => format!("Created product {}", form.name),
    })
}

pub async fn edit_product(client: &ClientState, args: EditProductArgs) -> Result<String, ViewError> {
    let id = args.id.clone();
    let product: Product = client
        .inner()
        .fetch_one(&id)
        .await
        .map_err(|e| ViewError::from_lookup("Product", &id, e))?;

    let mut form = ProductFormData::from(&product);
    args.apply(&mut form);

    client.inner().update_product(&id, &form).await?;
    info!(%id, "Product updated");
    Ok(format!("Updated product {}", id))
}

pub async fn delete_product(client: &ClientState, id: &str) -> Result<String, ViewError> {
    client
        .inner()
        .delete_product(id)
        .await
        .map_err(|e| ViewError::from_lookup("Product", id, e))?;

    info!(%id, "Product deleted");
    Ok(format!("Deleted product {}", id))
}
