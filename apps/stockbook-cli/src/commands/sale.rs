//! # Sale Commands
//!
//! Sales table, sale detail with its products, the new-sale form, and the
//! sales CSV export.
//!
//! ## New Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales add --client Ana --product p1 --product p2 --quantity p2=3       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch_batch::<Product>([p1, p2]) ── any missing ──► NOT_FOUND          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SelectionState: clear + extend (duplicates dropped)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  line items: quantity 1, unit price = product price, then overrides     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_sale (total = Σ qty × price) ──► POST /sales ──► clear selection│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Display;
use std::str::FromStr;

use clap::{Args, Subcommand};
use serde_json::json;
use stockbook_core::export::{to_csv_rows, to_records, SALES_FILENAME};
use stockbook_core::{Money, Product, Record, Sale, SaleFormData, SelectedProducts};
use tracing::{debug, info, warn};

use super::{created_id, render_listing, render_table, ListArgs};
use crate::download::trigger_download;
use crate::error::ViewError;
use crate::state::{ClientState, ConfigState, SelectionState};

const COLUMNS: &[&str] = &["_id", "date", "clientName", "total"];
const ITEM_COLUMNS: &[&str] = &["product", "quantity", "unitPrice", "lineTotal"];

#[derive(Debug, Clone, Subcommand)]
pub enum SaleCommand {
    /// Sales table
    List(ListArgs),

    /// One sale with its products
    Show { id: String },

    /// Record a sale of the given products
    Add(NewSaleArgs),

    /// Delete a sale
    Delete { id: String },

    /// Write sales to sales.csv in the download directory
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct NewSaleArgs {
    #[arg(long)]
    pub client: String,

    /// Product to sell (repeatable)
    #[arg(long = "product", required = true)]
    pub products: Vec<String>,

    /// Quantity for a product, as PRODUCT_ID=QTY (default 1)
    #[arg(long = "quantity", value_parser = parse_assignment::<i64>)]
    pub quantities: Vec<(String, i64)>,

    /// Unit price for a product, as PRODUCT_ID=PRICE (default: its price)
    #[arg(long = "price", value_parser = parse_assignment::<Money>)]
    pub prices: Vec<(String, Money)>,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Sales to export; every sale when omitted
    pub ids: Vec<String>,
}

/// Parses `KEY=VALUE`.
fn parse_assignment<T>(s: &str) -> Result<(String, T), String>
where
    T: FromStr,
    T::Err: Display,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT_ID=VALUE, got '{}'", s))?;
    let value = value.trim().parse::<T>().map_err(|e| e.to_string())?;
    Ok((key.trim().to_string(), value))
}

pub async fn run(
    client: &ClientState,
    config: &ConfigState,
    selection: &SelectionState,
    command: SaleCommand,
) -> Result<String, ViewError> {
    match command {
        SaleCommand::List(args) => list_sales(client, config, &args).await,
        SaleCommand::Show { id } => show_sale(client, &id).await,
        SaleCommand::Add(args) => add_sale(client, selection, args).await,
        SaleCommand::Delete { id } => delete_sale(client, &id).await,
        SaleCommand::Export(args) => export_sales(client, config, &args).await,
    }
}

/// Renders the sales table.
pub async fn list_sales(
    client: &ClientState,
    config: &ConfigState,
    args: &ListArgs,
) -> Result<String, ViewError> {
    let sales: Vec<Sale> = client.inner().fetch_many().await?;
    debug!(count = sales.len(), "Listing sales");

    Ok(render_listing(
        to_records(&sales)?,
        COLUMNS,
        args,
        config.page_size,
        "sales",
    ))
}

/// Renders a sale and its line items.
///
/// Products that could not be loaded are shown by id; the sale itself must
/// load.
pub async fn show_sale(client: &ClientState, id: &str) -> Result<String, ViewError> {
    let view = client.inner().fetch_sale_with_products(id).await;

    let sale = match view.sale {
        Some(sale) => sale,
        None => {
            return Err(match view.error {
                Some(err) => ViewError::from_lookup("Sale", id, err),
                None => ViewError::internal(),
            })
        }
    };

    let rows: Vec<Record> = sale
        .products
        .iter()
        .zip(view.products.iter().chain(std::iter::repeat(&None)))
        .map(|(item, product)| {
            let name = match product {
                Some(p) => p.name.clone(),
                None => format!("(unavailable: {})", item.product_id),
            };
            let mut row = Record::new();
            row.insert("product".into(), json!(name));
            row.insert("quantity".into(), json!(item.quantity));
            row.insert("unitPrice".into(), json!(item.unit_price.to_string()));
            row.insert("lineTotal".into(), json!(item.line_total().to_string()));
            row
        })
        .collect();

    let mut out = vec![
        format!("Sale    {}", sale.id),
        format!("Date    {}", sale.date.format("%Y-%m-%d %H:%M")),
        format!("Client  {}", sale.client_name().unwrap_or("-")),
        format!("Total   {}", sale.total),
    ];
    if rows.is_empty() {
        out.push("\nNo line items".to_string());
    } else {
        out.push(String::new());
        out.push(render_table(&rows, ITEM_COLUMNS));
    }

    if let Some(err) = view.error {
        warn!(sale_id = id, "Some products of the sale failed to load: {}", err);
        out.push("\nSome products could not be loaded".to_string());
    }

    Ok(out.join("\n"))
}

/// Records a sale of the selected products.
pub async fn add_sale(
    client: &ClientState,
    selection: &SelectionState,
    args: NewSaleArgs,
) -> Result<String, ViewError> {
    let batch = client.inner().fetch_batch::<Product>(&args.products).await;
    if let Some(err) = batch.error {
        let missing = args
            .products
            .iter()
            .zip(&batch.data)
            .find(|(_, product)| product.is_none())
            .map(|(id, _)| id.as_str())
            .unwrap_or_default();
        return Err(ViewError::from_lookup("Product", missing, err));
    }

    selection.with_selection_mut(|s| {
        s.clear();
        s.extend(batch.data.into_iter().flatten());
    });

    let mut items = selection.with_selection(SelectedProducts::to_sale_items);
    for (product_id, quantity) in &args.quantities {
        let item = items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| not_in_sale(product_id))?;
        item.quantity = *quantity;
    }
    for (product_id, price) in &args.prices {
        let item = items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| not_in_sale(product_id))?;
        item.unit_price = *price;
    }

    let form = SaleFormData::new(args.client, items);
    let response = client.inner().create_sale(&form).await?;
    selection.with_selection_mut(SelectedProducts::clear);

    info!(client = %form.client_name, total = %form.total, "Sale recorded");
    let id = created_id(&response).unwrap_or("-");
    Ok(format!(
        "Recorded sale {} for {}: {} items, total {}",
        id,
        form.client_name,
        form.products.len(),
        form.total
    ))
}

fn not_in_sale(product_id: &str) -> ViewError {
    ViewError::validation(format!("{} is not part of this sale", product_id))
}

pub async fn delete_sale(client: &ClientState, id: &str) -> Result<String, ViewError> {
    client
        .inner()
        .delete_sale(id)
        .await
        .map_err(|e| ViewError::from_lookup("Sale", id, e))?;

    info!(%id, "Sale deleted");
    Ok(format!("Deleted sale {}", id))
}

/// Writes the chosen sales (header plus rows) to `sales.csv`.
pub async fn export_sales(
    client: &ClientState,
    config: &ConfigState,
    args: &ExportArgs,
) -> Result<String, ViewError> {
    let sales: Vec<Sale> = if args.ids.is_empty() {
        client.inner().fetch_many().await?
    } else {
        let batch = client.inner().fetch_batch::<Sale>(&args.ids).await;
        if let Some(err) = batch.error {
            return Err(err.into());
        }
        batch.data.into_iter().flatten().collect()
    };

    if sales.is_empty() {
        return Ok("No sales to export".to_string());
    }

    let csv = to_csv_rows(&to_records(&sales)?);
    let path = trigger_download(&config.download_dir, SALES_FILENAME, &csv)?;

    info!(count = sales.len(), path = %path.display(), "Sales exported");
    Ok(format!("Exported {} sales to {}", sales.len(), path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{product, sale, Backend, Store};
    use std::fs;
    use tempfile::tempdir;

    fn store() -> Store {
        Store {
            products: vec![
                product("p1", "Zelda", 50.0, 1),
                product("p2", "Mario Kart", 35.5, 4),
            ],
            sales: vec![
                sale("s1", "Ana", &[("p1", 1, 50.0), ("p2", 2, 35.5)]),
                sale("s2", "Luis", &[("p2", 1, 30.0)]),
            ],
            ..Store::default()
        }
    }

    fn new_sale(products: &[&str]) -> NewSaleArgs {
        NewSaleArgs {
            client: "Marta".into(),
            products: products.iter().map(|p| p.to_string()).collect(),
            quantities: Vec::new(),
            prices: Vec::new(),
        }
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment::<i64>("p1=3").unwrap(),
            ("p1".to_string(), 3)
        );
        assert_eq!(
            parse_assignment::<Money>("p2 = 9.99").unwrap(),
            ("p2".to_string(), Money::from_cents(999))
        );
        assert!(parse_assignment::<i64>("p1").is_err());
        assert!(parse_assignment::<i64>("p1=many").is_err());
    }

    #[tokio::test]
    async fn test_list_sorted_by_total() {
        let backend = Backend::spawn(store()).await;
        let args = ListArgs {
            sort: Some("total".into()),
            desc: true,
            page: 1,
        };

        let out = list_sales(&backend.client(), &ConfigState::new("."), &args)
            .await
            .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].split_whitespace().collect::<Vec<_>>(), COLUMNS);
        assert!(lines[1].starts_with("s1"));
        assert!(lines[1].contains("Ana"));
        assert!(lines[2].starts_with("s2"));
    }

    #[tokio::test]
    async fn test_show_sale_with_products() {
        let backend = Backend::spawn(store()).await;

        let out = show_sale(&backend.client(), "s1").await.unwrap();
        assert!(out.contains("Client  Ana"));
        assert!(out.contains("Total   121.00"));
        assert!(out.contains("Zelda"));
        assert!(out.contains("Mario Kart  2         35.50      71.00"));
        assert!(!out.contains("could not be loaded"));
    }

    #[tokio::test]
    async fn test_show_sale_with_deleted_product() {
        let backend = Backend::spawn(store()).await;
        backend.with_store(|s| s.products.retain(|p| p["_id"] != "p2"));

        let out = show_sale(&backend.client(), "s1").await.unwrap();
        assert!(out.contains("Zelda"));
        assert!(out.contains("(unavailable: p2)"));
        assert!(out.ends_with("Some products could not be loaded"));
    }

    #[tokio::test]
    async fn test_show_missing_sale() {
        let backend = Backend::spawn(store()).await;
        let err = show_sale(&backend.client(), "s9").await.unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Sale not found: s9");
    }

    #[tokio::test]
    async fn test_add_sale_applies_overrides() {
        let backend = Backend::spawn(store()).await;
        let selection = SelectionState::new();
        let mut args = new_sale(&["p1", "p2", "p1"]);
        args.quantities.push(("p2".into(), 3));
        args.prices.push(("p1".into(), Money::from_cents(4500)));

        let out = add_sale(&backend.client(), &selection, args).await.unwrap();
        assert_eq!(out, "Recorded sale s101 for Marta: 2 items, total 151.50");

        let stored = backend.with_store(|s| s.sales.last().cloned().unwrap());
        assert_eq!(stored["clientName"], "Marta");
        assert_eq!(stored["total"], 151.5);
        assert_eq!(stored["products"][1]["quantity"], 3);
        assert_eq!(stored["products"][0]["unitPrice"], 45);
        assert!(selection.with_selection(|s| s.is_empty()));
    }

    #[tokio::test]
    async fn test_add_sale_with_unknown_product() {
        let backend = Backend::spawn(store()).await;
        let selection = SelectionState::new();

        let err = add_sale(&backend.client(), &selection, new_sale(&["p1", "p404"]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: p404");
        assert_eq!(backend.hits("POST /sales"), 0);
    }

    #[tokio::test]
    async fn test_add_sale_override_must_match_selection() {
        let backend = Backend::spawn(store()).await;
        let selection = SelectionState::new();
        let mut args = new_sale(&["p1"]);
        args.quantities.push(("p2".into(), 2));

        let err = add_sale(&backend.client(), &selection, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "p2 is not part of this sale");
        assert_eq!(backend.hits("POST /sales"), 0);
    }

    #[tokio::test]
    async fn test_add_sale_rejects_zero_quantity() {
        let backend = Backend::spawn(store()).await;
        let selection = SelectionState::new();
        let mut args = new_sale(&["p1"]);
        args.quantities.push(("p1".into(), 0));

        let err = add_sale(&backend.client(), &selection, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.starts_with("quantity0:"));
        assert_eq!(selection.with_selection(|s| s.len()), 1);
    }

    #[tokio::test]
    async fn test_add_sale_rejects_overflowing_quantity() {
        let backend = Backend::spawn(store()).await;
        let selection = SelectionState::new();
        let mut args = new_sale(&["p1"]);
        args.quantities.push(("p1".into(), i64::MAX));

        let err = add_sale(&backend.client(), &selection, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "quantity0: quantity is too large");
        assert_eq!(backend.hits("POST /sales"), 0);
    }

    #[tokio::test]
    async fn test_export_all_sales() {
        let backend = Backend::spawn(store()).await;
        let dir = tempdir().unwrap();
        let config = ConfigState::new(dir.path());

        let out = export_sales(&backend.client(), &config, &ExportArgs { ids: Vec::new() })
            .await
            .unwrap();
        assert!(out.starts_with("Exported 2 sales to "));

        let csv = fs::read_to_string(dir.path().join(SALES_FILENAME)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "_id,date,total,products,clientName,__v");
        assert!(lines[1].starts_with("\"s1\","));
        assert!(lines[1].ends_with(",\"Ana\",0"));
        assert!(!csv.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_export_selected_sales() {
        let backend = Backend::spawn(store()).await;
        let dir = tempdir().unwrap();
        let config = ConfigState::new(dir.path());

        export_sales(
            &backend.client(),
            &config,
            &ExportArgs {
                ids: vec!["s2".into()],
            },
        )
        .await
        .unwrap();

        let csv = fs::read_to_string(dir.path().join(SALES_FILENAME)).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("\"Luis\""));
        assert!(!csv.contains("\"Ana\""));
    }

    #[tokio::test]
    async fn test_export_nothing() {
        let backend = Backend::spawn(Store::default()).await;
        let dir = tempdir().unwrap();

        let out = export_sales(
            &backend.client(),
            &ConfigState::new(dir.path()),
            &ExportArgs { ids: Vec::new() },
        )
        .await
        .unwrap();
        assert_eq!(out, "No sales to export");
        assert!(!dir.path().join(SALES_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_delete_sale_refreshes_list() {
        let backend = Backend::spawn(store()).await;
        let client = backend.client();
        let config = ConfigState::new(".");
        let args = ListArgs {
            sort: None,
            desc: false,
            page: 1,
        };

        list_sales(&client, &config, &args).await.unwrap();
        assert_eq!(delete_sale(&client, "s1").await.unwrap(), "Deleted sale s1");

        let out = list_sales(&client, &config, &args).await.unwrap();
        assert!(!out.contains("Ana"));
        assert_eq!(backend.hits("GET /sales"), 2);
    }
}
