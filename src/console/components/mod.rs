//! Reusable UI components for the console
//!
//! `option_matcher` and `data_table` hold the pure logic (filtering and row
//! projection); the rest are stateful widgets that render with ratatui.

pub mod autocomplete;
pub mod confirm_dialog;
pub mod data_table;
pub mod form_field;
pub mod option_matcher;
pub mod toast;

pub use autocomplete::{AutoCompleteSelect, SelectState};
pub use confirm_dialog::{ConfirmDialog, DialogResponse};
pub use data_table::{Column, DataTable, RowAction, TableEvent, TableRow, TableView};
pub use form_field::{FieldSet, FormField, FormFieldType};
pub use option_matcher::OptionMatcher;
pub use toast::{Severity, Toast, ToastMessage};
