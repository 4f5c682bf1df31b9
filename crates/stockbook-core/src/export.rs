//! # CSV Export
//!
//! Turns lists of entities into the CSV text used for backups and invoices.
//!
//! ## Document Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  # Productos                         ◄── title line                     │
//! │  _id,name,price,...                  ◄── keys of the FIRST record       │
//! │  "p1","Zelda",59.99,...              ◄── one JSON value per column      │
//! │  "p2","Metroid",""...                ◄── missing / null ──► ""          │
//! │                                      ◄── trailing blank line            │
//! │  # Ventas                            ◄── next block, no separator       │
//! │  ...                                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Field Encoding
//! Every field is the JSON text of its value: strings are quoted and escaped,
//! numbers and booleans are bare, arrays and objects are stringified whole.
//! Because of that a data row is one JSON array without its brackets, which is
//! what [`decode_row`] relies on.
//!
//! Header names are written as-is (unquoted).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// One exportable row: field name → value, in insertion order.
pub type Record = Map<String, Value>;

/// File name of the full backup.
pub const BACKUP_FILENAME: &str = "backup_inventario.csv";

/// File name of the sales-only export.
pub const SALES_FILENAME: &str = "sales.csv";

/// MIME type of every export.
pub const CSV_MIME: &str = "text/csv";

/// Title of the products block in a backup.
pub const PRODUCTS_TITLE: &str = "Productos";

/// Title of the sales block in a backup.
pub const SALES_TITLE: &str = "Ventas";

// =============================================================================
// Records
// =============================================================================

/// Serializes an entity into a [`Record`].
///
/// ## Errors
/// [`CoreError::NotARecord`] when the value is not a JSON object.
pub fn to_record<T: Serialize>(item: &T) -> CoreResult<Record> {
    match serde_json::to_value(item).map_err(|e| CoreError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::NotARecord {
            found: value_kind(&other).to_string(),
        }),
    }
}

/// Serializes a list of entities into records.
pub fn to_records<T: Serialize>(items: &[T]) -> CoreResult<Vec<Record>> {
    items.iter().map(to_record).collect()
}

/// Takes the records of a JSON list exactly as the backend sent them.
///
/// Used where nothing may be lost or reformatted, e.g. prices with more than
/// two decimals or fields no entity type declares.
///
/// ## Errors
/// [`CoreError::NotARecord`] when the value is not an array of objects.
pub fn records_from_json(value: &Value) -> CoreResult<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(CoreError::NotARecord {
            found: value_kind(value).to_string(),
        });
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map.clone()),
            other => Err(CoreError::NotARecord {
                found: value_kind(other).to_string(),
            }),
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Serializes records into a titled CSV block.
///
/// Returns an empty string for an empty list. Otherwise the block is
/// `# {title}`, the header, one line per record and a blank line, joined with
/// `\n`; it therefore always ends with a newline, and blocks can be
/// concatenated directly.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use stockbook_core::export::{to_csv, Record};
///
/// let record: Record = json!({ "name": "a,b", "stock": 2 }).as_object().unwrap().clone();
/// assert_eq!(to_csv(&[record], "Productos"), "# Productos\nname,stock\n\"a,b\",2\n");
/// ```
pub fn to_csv(records: &[Record], title: &str) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(records.len() + 3);
    lines.push(format!("# {}", title));
    lines.extend(table_lines(records));
    lines.push(String::new());
    lines.join("\n")
}

/// Serializes records as header plus rows only (no title, no trailing line).
///
/// This is the layout of the sales invoice export.
pub fn to_csv_rows(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }
    table_lines(records).join("\n")
}

fn table_lines(records: &[Record]) -> Vec<String> {
    let headers: Vec<&String> = match records.first() {
        Some(first) => first.keys().collect(),
        None => return Vec::new(),
    };

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        lines.push(
            headers
                .iter()
                .map(|h| encode_field(record.get(h.as_str())))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines
}

/// Encodes one field as JSON text; missing and null become `""`.
pub fn encode_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "\"\"".to_string(),
        Some(v) => v.to_string(),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes a data row back into its field values.
///
/// ## Example
/// ```rust
/// use stockbook_core::export::decode_row;
///
/// let values = decode_row("\"a,b\",2").unwrap();
/// assert_eq!(values[0], "a,b");
/// assert_eq!(values[1], 2);
/// ```
pub fn decode_row(row: &str) -> CoreResult<Vec<Value>> {
    serde_json::from_str(&format!("[{}]", row)).map_err(|e| CoreError::MalformedRow(e.to_string()))
}

// =============================================================================
// Backup Document
// =============================================================================

/// Builder for a multi-block CSV document.
///
/// ## Usage
/// ```rust
/// use stockbook_core::export::BackupDocument;
///
/// let doc = BackupDocument::new().block("Productos", &[]).finish();
/// assert!(doc.is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct BackupDocument {
    content: String,
}

impl BackupDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a titled block. Empty lists add nothing.
    pub fn block(mut self, title: &str, records: &[Record]) -> Self {
        self.content.push_str(&to_csv(records, title));
        self
    }

    /// The full inventory backup: products, then sales.
    pub fn inventory(products: &[Record], sales: &[Record]) -> Self {
        Self::new()
            .block(PRODUCTS_TITLE, products)
            .block(SALES_TITLE, sales)
    }

    /// Returns the document text, or `None` when every block was empty.
    pub fn finish(self) -> Option<String> {
        if self.content.is_empty() {
            None
        } else {
            Some(self.content)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
