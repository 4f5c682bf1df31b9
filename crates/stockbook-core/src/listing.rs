//! # Listing
//!
//! Sorting and pagination for the product and sale tables.
//!
//! ## Ordering Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  numbers   compared numerically          9 < 10                         │
//! │  strings   compared lexicographically    "a" < "b"                      │
//! │  mixed     numbers < strings < others                                   │
//! │  missing   always LAST, in both directions                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::export::Record;

/// Rows per table page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sorts records in place by one column. The sort is stable.
pub fn sort_records(records: &mut [Record], column: &str, direction: SortDirection) {
    records.sort_by(|a, b| compare_column(a.get(column), b.get(column), direction));
}

fn compare_column(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Total order over present JSON values.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Zero-based page index (clamped to the last page).
    pub index: usize,
    pub page_count: usize,
    pub total_items: usize,
}

impl<'a, T> Page<'a, T> {
    pub fn can_previous(&self) -> bool {
        self.index > 0
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.page_count
    }
}

/// Slices out page `index` of `items`.
///
/// An empty table has one empty page. A `page_size` of zero is treated as
/// [`DEFAULT_PAGE_SIZE`].
pub fn paginate<T>(items: &[T], index: usize, page_size: usize) -> Page<'_, T> {
    let size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let page_count = items.len().div_ceil(size).max(1);
    let index = index.min(page_count - 1);

    let start = (index * size).min(items.len());
    let end = (start + size).min(items.len());

    Page {
        items: &items[start..end],
        index,
        page_count,
        total_items: items.len(),
    }
}
