//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the page's `#alert-container`, either as the
//! target of an error response or as an out-of-band swap alongside a grid row.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A dismissible message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn parts(&self) -> (bool, &str, Option<&str>) {
        match self {
            Alert::Success { message, details } => (true, message, Some(details)),
            Alert::SuccessSimple { message } => (true, message, None),
            Alert::Error { message, details } => (false, message, Some(details)),
            Alert::ErrorSimple { message } => (false, message, None),
        }
    }

    /// Render the alert body, to be placed inside `#alert-container`.
    pub fn into_html(self) -> Html<String> {
        Html(self.markup().into_string())
    }

    /// Render the alert wrapped in an out-of-band swap of `#alert-container`,
    /// for responses whose main content is something else, e.g. a table row.
    pub fn into_oob_markup(self) -> Markup {
        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                (self.markup())
            }
        }
    }

    fn markup(&self) -> Markup {
        let (is_success, message, details) = self.parts();
        let style = if is_success {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400"
        } else {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400"
        };

        html! {
            div
                class=(style)
                role="alert"
                data-alert-kind=(if is_success { "success" } else { "error" })
            {
                div class="flex justify-between items-start gap-4"
                {
                    div
                    {
                        span class="font-medium" { (message) }

                        @if let Some(details) = details.filter(|details| !details.is_empty()) {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                        class="font-bold"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
