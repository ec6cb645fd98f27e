//! Full-page responses for missing pages and internal server errors.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// The 404 page.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        let page = error_view(
            "Not Found",
            "404",
            "Something's missing.",
            "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        );

        (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
    }
}

/// Router fallback for unknown routes.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}

/// The 500 page, with a description of what went wrong and how to fix it.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::test_utils::{assert_valid_html, parse_html_document};

    use super::{InternalServerError, get_404_not_found};

    #[tokio::test]
    async fn not_found_page_is_valid_html() {
        let response = get_404_not_found().await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
    }

    #[tokio::test]
    async fn internal_error_page_shows_fix() {
        let response = InternalServerError {
            description: "Broken",
            fix: "Restart the server",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Restart the server"), "got {text:?}");
    }
}
