//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, endpoints,
    error_pages::get_404_not_found,
    grid::{
        begin_edit_endpoint, cancel_delete_endpoint, cancel_edit_endpoint, change_field_endpoint,
        confirm_delete_endpoint, create_row_endpoint, duplicate_row_endpoint,
        get_transactions_page, keydown_endpoint, request_delete_endpoint, save_row_endpoint,
    },
    preferences::update_preferences_endpoint,
    summary::{get_summary_json, get_summary_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::SUMMARY_VIEW, get(get_summary_page));

    let grid_routes = Router::new()
        .route(endpoints::GRID_ROWS, post(create_row_endpoint))
        .route(endpoints::GRID_ROW, delete(confirm_delete_endpoint))
        .route(endpoints::GRID_ROW_EDIT, post(begin_edit_endpoint))
        .route(endpoints::GRID_ROW_FIELD, put(change_field_endpoint))
        .route(endpoints::GRID_ROW_SAVE, post(save_row_endpoint))
        .route(endpoints::GRID_ROW_CANCEL, post(cancel_edit_endpoint))
        .route(endpoints::GRID_ROW_KEYDOWN, post(keydown_endpoint))
        .route(endpoints::GRID_ROW_DUPLICATE, post(duplicate_row_endpoint))
        .route(endpoints::GRID_ROW_DELETE_REQUEST, post(request_delete_endpoint))
        .route(endpoints::GRID_ROW_DELETE_CANCEL, post(cancel_delete_endpoint));

    let api_routes = Router::new()
        .route(endpoints::SUMMARY_API, get(get_summary_json))
        .route(endpoints::PREFERENCES_API, post(update_preferences_endpoint));

    page_routes
        .merge(grid_routes)
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transaction grid.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}
