//! The endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/grid/rows/{row_id}', use [format_endpoint].

use std::fmt::Display;

/// The root route which redirects to the transaction grid.
pub const ROOT: &str = "/";
/// The transaction grid for a week or month.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// Category, period and budget totals.
pub const SUMMARY_VIEW: &str = "/summary";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to start a new row in the grid.
pub const GRID_ROWS: &str = "/api/grid/rows";
/// The route to confirm the deletion of a row.
pub const GRID_ROW: &str = "/api/grid/rows/{row_id}";
/// The route to put a row into edit mode.
pub const GRID_ROW_EDIT: &str = "/api/grid/rows/{row_id}/edit";
/// The route to change one field of a row.
pub const GRID_ROW_FIELD: &str = "/api/grid/rows/{row_id}/field";
/// The route to save a row.
pub const GRID_ROW_SAVE: &str = "/api/grid/rows/{row_id}/save";
/// The route to discard the changes to a row.
pub const GRID_ROW_CANCEL: &str = "/api/grid/rows/{row_id}/cancel";
/// The route for keyboard shortcuts on a row.
pub const GRID_ROW_KEYDOWN: &str = "/api/grid/rows/{row_id}/keydown";
/// The route to copy a row into a new draft.
pub const GRID_ROW_DUPLICATE: &str = "/api/grid/rows/{row_id}/duplicate";
/// The route to ask for confirmation before deleting a row.
pub const GRID_ROW_DELETE_REQUEST: &str = "/api/grid/rows/{row_id}/delete";
/// The route to back out of deleting a row.
pub const GRID_ROW_DELETE_CANCEL: &str = "/api/grid/rows/{row_id}/delete/cancel";

/// The summary chart series as JSON.
pub const SUMMARY_API: &str = "/api/summary";
/// The route to change the view preferences.
pub const PREFERENCES_API: &str = "/api/preferences";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/rows/{row_id}', '{row_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
