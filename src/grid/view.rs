//! Markup for the transaction grid page and its rows.

use maud::{Markup, html};
use time::Date;

use crate::{
    date_range::range_label,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
    preferences::{ViewPreferences, preferences_form},
};

use super::{
    cell::Cell,
    reference::ReferenceData,
    row::{Field, RowId},
    session::{EditSession, GridRow, RowState},
};

/// The HTML `id` of a row's `tr`.
pub fn row_element_id(row_id: RowId) -> String {
    format!("grid-row-{row_id}")
}

/// Render the grid page with every row in the session.
pub fn grid_page(session: &EditSession, preferences: &ViewPreferences, today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let range = preferences.date_range(today);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-6xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { "Transactions" }
                        p class="text-sm text-gray-500 dark:text-gray-400" { (range_label(range)) }
                    }

                    (preferences_form(preferences, today, false))
                }

                div class="flex justify-between items-center"
                {
                    button
                        type="button"
                        class=(BUTTON_PRIMARY_STYLE)
                        hx-post=(endpoints::GRID_ROWS)
                        hx-target="#grid-body"
                        hx-swap="afterbegin"
                        hx-target-error="#alert-container"
                    {
                        "Add transaction"
                    }

                    a href=(endpoints::SUMMARY_VIEW) class=(LINK_STYLE) { "View summary" }
                }

                div class="overflow-x-auto rounded shadow-md"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                @for field in Field::ALL {
                                    th scope="col" class=(TABLE_CELL_STYLE) { (field.label()) }
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    span class="sr-only" { "Actions" }
                                }
                            }
                        }

                        tbody id="grid-body"
                        {
                            @for grid_row in session.rows() {
                                (row_view(grid_row, session.reference(), &preferences.currency_symbol))
                            }
                        }
                    }
                }

                @if session.rows().is_empty() {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "No transactions in this range. Click \"Add transaction\" to create one."
                    }
                }
            }
        }
    };

    base("Transactions", &content)
}

/// Render one row.
///
/// Enter and Escape are sent to the server from anywhere in the row. A key
/// pressed in a cell also carries that cell's value, because the browser
/// fires `keydown` before the `change` that would send it.
pub fn row_view(grid_row: &GridRow, reference: &ReferenceData, currency_symbol: &str) -> Markup {
    row_markup(grid_row, reference, currency_symbol, false)
}

/// Render a row that replaces the row with the same `id` out of band, e.g.
/// the next row after Enter.
pub fn row_view_oob(grid_row: &GridRow, reference: &ReferenceData, currency_symbol: &str) -> Markup {
    row_markup(grid_row, reference, currency_symbol, true)
}

const KEYDOWN_VALS: &str = "js:{key: event.key, \
    ...(event.target.dataset.field \
        ? {field: event.target.dataset.field, value: event.target.value} \
        : {})}";

fn row_markup(
    grid_row: &GridRow,
    reference: &ReferenceData,
    currency_symbol: &str,
    oob: bool,
) -> Markup {
    let row_id = grid_row.id();

    html! {
        tr
            id=(row_element_id(row_id))
            class=(TABLE_ROW_STYLE)
            tabindex="0"
            data-row-id=(row_id)
            data-row-state=(grid_row.state().as_str())
            hx-swap-oob=[oob.then_some("true")]
            hx-post=(format_endpoint(endpoints::GRID_ROW_KEYDOWN, row_id))
            hx-trigger="keydown[key=='Enter'||key=='Escape']"
            hx-vals=(KEYDOWN_VALS)
            hx-target="this"
            hx-swap="outerHTML"
            hx-sync="this:queue all"
            hx-target-error="#alert-container"
        {
            @for field in Field::ALL {
                (Cell::for_field(grid_row, field, reference, currency_symbol).into_html())
            }

            td class="px-4 py-2 whitespace-nowrap"
            {
                (row_actions(grid_row))

                @if let Some(message) = grid_row.message() {
                    p class="mt-1 text-xs text-red-600 dark:text-red-400" role="status" { (message) }
                }
            }
        }
    }
}

/// A button that posts to `endpoint` and replaces the row with the response.
fn action_button(label: &str, endpoint: &str, style: &str) -> Markup {
    html! {
        button
            type="button"
            class=(style)
            hx-post=(endpoint)
            hx-target="closest tr"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
        {
            (label)
        }
    }
}

fn row_actions(grid_row: &GridRow) -> Markup {
    let row_id = grid_row.id();

    if grid_row.state() == RowState::Saving {
        return html! {
            span class="text-gray-500" { (loading_spinner()) "Saving" }
        };
    }

    if grid_row.is_delete_requested() {
        return html! {
            span class="flex items-center gap-2"
            {
                span { "Delete?" }
                button
                    type="button"
                    class=(BUTTON_DELETE_STYLE)
                    hx-delete=(format_endpoint(endpoints::GRID_ROW, row_id))
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                {
                    "Confirm"
                }
                (action_button(
                    "Keep",
                    &format_endpoint(endpoints::GRID_ROW_DELETE_CANCEL, row_id),
                    LINK_STYLE,
                ))
            }
        };
    }

    match grid_row.state() {
        RowState::Edit => html! {
            span class="flex items-center gap-2"
            {
                (action_button(
                    "Save",
                    &format_endpoint(endpoints::GRID_ROW_SAVE, row_id),
                    BUTTON_PRIMARY_STYLE,
                ))
                (action_button(
                    "Cancel",
                    &format_endpoint(endpoints::GRID_ROW_CANCEL, row_id),
                    BUTTON_SECONDARY_STYLE,
                ))
            }
        },
        RowState::Read | RowState::Saving => html! {
            span class="flex items-center gap-3"
            {
                (action_button(
                    "Edit",
                    &format_endpoint(endpoints::GRID_ROW_EDIT, row_id),
                    LINK_STYLE,
                ))

                button
                    type="button"
                    class=(LINK_STYLE)
                    hx-post=(format_endpoint(endpoints::GRID_ROW_DUPLICATE, row_id))
                    hx-target="closest tr"
                    hx-swap="afterend"
                    hx-target-error="#alert-container"
                {
                    "Duplicate"
                }

                (action_button(
                    "Delete",
                    &format_endpoint(endpoints::GRID_ROW_DELETE_REQUEST, row_id),
                    BUTTON_DELETE_STYLE,
                ))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use scraper::{ElementRef, Html, Selector};
    use time::macros::date;

    use crate::{
        grid::{EditSession, Field},
        preferences::ViewPreferences,
        test_utils::assert_valid_html,
    };

    use super::{grid_page, row_view, row_view_oob};

    fn parse_row(markup: maud::Markup) -> Html {
        Html::parse_fragment(&format!(
            "<table><tbody>{}</tbody></table>",
            markup.into_string()
        ))
    }

    fn must_get_row(html: &Html) -> ElementRef<'_> {
        html.select(&Selector::parse("tr").unwrap())
            .next()
            .expect("No row found")
    }

    fn button_labels(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("button").unwrap())
            .map(|button| button.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[test]
    fn draft_row_has_save_and_cancel() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));

        let html = parse_row(row_view(
            session.get(row_id).unwrap(),
            session.reference(),
            "$",
        ));

        let row = must_get_row(&html);
        assert_eq!(row.value().attr("data-row-state"), Some("edit"));
        assert_eq!(row.value().id(), Some(format!("grid-row-{row_id}").as_str()));
        assert_eq!(
            row.value().attr("hx-post"),
            Some(format!("/api/grid/rows/{row_id}/keydown").as_str())
        );
        assert_eq!(button_labels(&html), vec!["Save", "Cancel"]);
        let date_input = html
            .select(&Selector::parse("input[type=date]").unwrap())
            .next()
            .expect("No date input");
        assert_eq!(date_input.value().attr("value"), Some("2024-06-05"));
    }

    #[test]
    fn keydown_sends_the_focused_cell_value() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));

        let html = parse_row(row_view(
            session.get(row_id).unwrap(),
            session.reference(),
            "$",
        ));

        let vals = must_get_row(&html).value().attr("hx-vals").unwrap_or_default();
        assert!(vals.starts_with("js:{key: event.key"));
        assert!(vals.contains("value: event.target.value"));
        let amount = html
            .select(&Selector::parse("input[aria-label=Amount]").unwrap())
            .next()
            .expect("No amount input");
        assert_eq!(amount.value().attr("data-field"), Some("amount"));
    }

    #[test]
    fn requested_delete_asks_for_confirmation() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));
        session.request_delete(row_id).unwrap();

        let html = parse_row(row_view(
            session.get(row_id).unwrap(),
            session.reference(),
            "$",
        ));

        assert_eq!(button_labels(&html), vec!["Confirm", "Keep"]);
        let confirm = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .next()
            .expect("No confirm button");
        assert_eq!(
            confirm.value().attr("hx-delete"),
            Some(format!("/api/grid/rows/{row_id}").as_str())
        );
    }

    #[test]
    fn invalid_amount_is_marked() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));
        session.begin_save(row_id).unwrap_err();

        let html = parse_row(row_view(
            session.get(row_id).unwrap(),
            session.reference(),
            "$",
        ));

        let invalid = html
            .select(&Selector::parse("[aria-invalid=true]").unwrap())
            .map(|element| element.value().attr("aria-label").unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(invalid, vec!["Amount", "Account", "Category"]);
    }

    #[test]
    fn oob_row_is_marked_for_swap() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));

        let html = parse_row(row_view_oob(
            session.get(row_id).unwrap(),
            session.reference(),
            "$",
        ));

        let row = must_get_row(&html);
        assert_eq!(row.value().attr("hx-swap-oob"), Some("true"));
    }

    #[test]
    fn page_lists_rows_and_columns() {
        let mut session = EditSession::new();
        session.create_row(date!(2024 - 06 - 05));
        let first = session.create_row(date!(2024 - 06 - 06));
        let preferences = ViewPreferences {
            anchor: Some(date!(2024 - 06 - 05)),
            ..Default::default()
        };

        let html = Html::parse_document(
            &grid_page(&session, &preferences, date!(2024 - 06 - 10)).into_string(),
        );

        assert_valid_html(&html);
        let headings = html
            .select(&Selector::parse("thead th").unwrap())
            .map(|heading| heading.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            headings[..Field::ALL.len()],
            ["Date", "Amount", "Account", "Budget", "Category"]
        );
        let rows = html
            .select(&Selector::parse("tbody#grid-body tr").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].value().attr("data-row-id"),
            Some(first.to_string().as_str())
        );
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("3 Jun 2024 - 9 Jun 2024"));
    }
}
