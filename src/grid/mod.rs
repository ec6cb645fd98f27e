//! The editable transaction grid.
//!
//! This module contains:
//! - The row model and parsing of submitted cell values
//! - The resolver that clears fields invalidated by a change
//! - The validation gate that blocks saving incomplete rows
//! - The edit session that tracks row states and talks to the persistence API
//! - The cells, views and route handlers for the grid page

mod cell;
mod endpoints;
mod reference;
mod resolver;
mod row;
mod session;
mod validation;
mod view;

pub use endpoints::{
    GridState, begin_edit_endpoint, cancel_delete_endpoint, cancel_edit_endpoint,
    change_field_endpoint, confirm_delete_endpoint, create_row_endpoint, duplicate_row_endpoint,
    get_transactions_page, keydown_endpoint, request_delete_endpoint, save_row_endpoint,
};
pub use row::{Field, FieldSet, RowId};
pub use session::EditSession;
