//! # Commands Module
//!
//! Every view of the back office, one subcommand each.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports, table rendering)
//! ├── product.rs   ◄─── Product table, detail and CRUD
//! ├── sale.rs      ◄─── Sales table, detail, new sale, CSV export
//! ├── platform.rs  ◄─── Platform table
//! └── backup.rs    ◄─── Inventory backup (products + sales CSV)
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stockbook products list --sort price --desc                            │
//! │         │                                                               │
//! │         ▼ (clap)                                                        │
//! │  list_products(&ClientState, &ConfigState, ListArgs)                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  QueryClient::fetch_many::<Product>() ──► cache hit or GET /products    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Result<String, ViewError> ──► stdout / stderr                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command declares only the state it needs and returns the rendered
//! view as text.

pub mod backup;
pub mod platform;
pub mod product;
pub mod sale;

use clap::Args;
use serde_json::Value;
use stockbook_core::listing::{paginate, sort_records, SortDirection};
use stockbook_core::Record;

/// Sorting and paging shared by every table view.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Column to sort by (wire name, e.g. `price`, `clientName`)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

impl ListArgs {
    fn direction(&self) -> SortDirection {
        if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Plain-text rendering of one cell.
pub(crate) fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| display_value(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Left-aligned table with one column per entry of `columns`.
pub(crate) fn render_table(records: &[Record], columns: &[&str]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| columns.iter().map(|c| display_value(r.get(*c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = vec![pad_line(columns, &widths)];
    out.extend(rows.iter().map(|row| {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        pad_line(&cells, &widths)
    }));
    out.join("\n")
}

fn pad_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Sorts, pages and renders a table view with its footer.
pub(crate) fn render_listing(
    mut records: Vec<Record>,
    columns: &[&str],
    args: &ListArgs,
    page_size: usize,
    noun: &str,
) -> String {
    if records.is_empty() {
        return format!("No {} found", noun);
    }

    if let Some(column) = &args.sort {
        sort_records(&mut records, column, args.direction());
    }

    let page = paginate(&records, args.page.saturating_sub(1), page_size);
    let mut out = render_table(page.items, columns);
    out.push_str(&format!(
        "\n\nPage {} of {} ({} {})",
        page.index + 1,
        page.page_count,
        page.total_items,
        noun
    ));
    if page.can_previous() {
        out.push_str(&format!("  previous: --page {}", page.index));
    }
    if page.can_next() {
        out.push_str(&format!("  next: --page {}", page.index + 2));
    }
    out
}

/// Aligned key/value lines for a detail view.
pub(crate) fn render_detail(record: &Record) -> String {
    let width = record.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    record
        .iter()
        .map(|(k, v)| format!("{:<width$}  {}", k, display_value(Some(v)), width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The `_id` the backend assigned in a create response, if it sent one.
pub(crate) fn created_id(response: &Value) -> Option<&str> {
    response.get("_id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let records = vec![
            record(json!({ "name": "Zelda", "price": 50 })),
            record(json!({ "name": "Mario Kart 64", "price": null })),
        ];
        let table = render_table(&records, &["name", "price"]);
        assert_eq!(
            table,
            "name           price\nZelda          50\nMario Kart 64  -"
        );
    }

    #[test]
    fn test_listing_sorts_and_pages() {
        let records: Vec<Record> = (1..=12)
            .map(|i| record(json!({ "_id": format!("p{}", i), "price": i })))
            .collect();
        let args = ListArgs {
            sort: Some("price".into()),
            desc: true,
            page: 2,
        };

        let out = render_listing(records, &["_id", "price"], &args, 10, "products");
        assert!(out.starts_with("_id  price\np2   2\np1   1"));
        assert!(out.ends_with("Page 2 of 2 (12 products)  previous: --page 1"));
    }

    #[test]
    fn test_empty_listing() {
        let args = ListArgs {
            sort: None,
            desc: false,
            page: 1,
        };
        assert_eq!(
            render_listing(Vec::new(), &["_id"], &args, 10, "sales"),
            "No sales found"
        );
    }

    #[test]
    fn test_display_value_flattens_arrays() {
        assert_eq!(display_value(Some(&json!(["ps1", "ps2"]))), "ps1, ps2");
        assert_eq!(display_value(Some(&json!(59.99))), "59.99");
        assert_eq!(display_value(None), "-");
    }
}
