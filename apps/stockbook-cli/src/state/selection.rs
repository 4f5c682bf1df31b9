//! # Selection State
//!
//! The products picked for the sale being built.
//!
//! ```text
//! sales add --product p1 --product p2
//!     │
//!     ▼
//! fetch_batch([p1, p2]) ──► with_selection_mut(|s| s.extend(..))
//!     │
//!     ▼
//! with_selection(|s| s.to_sale_form(client)) ──► create_sale ──► clear
//! ```

use std::sync::{Arc, Mutex};

use stockbook_core::SelectedProducts;

/// Shared, lock-protected [`SelectedProducts`].
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selection: Arc<Mutex<SelectedProducts>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the selection.
    pub fn with_selection<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SelectedProducts) -> R,
    {
        let selection = self.selection.lock().expect("Selection mutex poisoned");
        f(&selection)
    }

    /// Executes a function with write access to the selection.
    pub fn with_selection_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SelectedProducts) -> R,
    {
        let mut selection = self.selection.lock().expect("Selection mutex poisoned");
        f(&mut selection)
    }
}
