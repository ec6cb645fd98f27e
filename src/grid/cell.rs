//! The cells of a grid row: read-only text, or an input that sends each
//! change to the server.

use maud::{Markup, html};
use time::Date;

use crate::{
    date_range::week_of,
    endpoints::{self, format_endpoint},
    html::{FORM_INPUT_INVALID_STYLE, FORM_TEXT_INPUT_STYLE, TABLE_CELL_STYLE, format_currency},
};

use super::{
    reference::ReferenceData,
    resolver::budget_is_valid,
    row::{Field, Row, RowId},
    session::{GridRow, RowState},
};

/// One choice in a select cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: i64,
    pub label: String,
}

/// The input rendered for an editable cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Date(Option<Date>),
    /// The amount without its sign, which comes from the category.
    Amount(Option<f64>),
    Select {
        field: Field,
        options: Vec<SelectOption>,
        selected: Option<i64>,
    },
}

impl CellInput {
    fn field(&self) -> Field {
        match self {
            CellInput::Date(_) => Field::Date,
            CellInput::Amount(_) => Field::Amount,
            CellInput::Select { field, .. } => *field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    ReadOnly {
        text: String,
    },
    Editable {
        row_id: RowId,
        input: CellInput,
        /// Whether the field must be filled in before the row can be saved.
        invalid: bool,
    },
}

impl Cell {
    /// The cell for `field`, editable only while the row is in edit mode.
    pub fn for_field(
        grid_row: &GridRow,
        field: Field,
        reference: &ReferenceData,
        currency_symbol: &str,
    ) -> Self {
        let row = grid_row.row();

        if grid_row.state() != RowState::Edit {
            return Cell::ReadOnly {
                text: display_text(row, field, reference, currency_symbol),
            };
        }

        let input = match field {
            Field::Date => CellInput::Date(row.date),
            Field::Amount => CellInput::Amount(row.amount.map(f64::abs)),
            Field::Account => CellInput::Select {
                field,
                options: reference
                    .accounts()
                    .iter()
                    .map(|account| SelectOption {
                        value: account.id,
                        label: account.name.clone(),
                    })
                    .collect(),
                selected: row.account,
            },
            Field::Budget => CellInput::Select {
                field,
                options: budget_options(row, reference),
                selected: row.budget,
            },
            Field::Category => CellInput::Select {
                field,
                options: category_options(reference),
                selected: row.category,
            },
        };

        Cell::Editable {
            row_id: row.id,
            input,
            invalid: grid_row.invalid_fields().contains(&field),
        }
    }

    pub fn into_html(self) -> Markup {
        match self {
            Cell::ReadOnly { text } => html! {
                td class=(TABLE_CELL_STYLE) { (text) }
            },
            Cell::Editable {
                row_id,
                input,
                invalid,
            } => editable_cell(row_id, input, invalid),
        }
    }
}

fn display_text(row: &Row, field: Field, reference: &ReferenceData, currency_symbol: &str) -> String {
    match field {
        Field::Date => row.date.map(|date| date.to_string()).unwrap_or_default(),
        Field::Amount => row
            .amount
            .map(|amount| format_currency(amount, currency_symbol))
            .unwrap_or_default(),
        Field::Account => row
            .account
            .and_then(|id| reference.account(id))
            .map(|account| account.name.clone())
            .unwrap_or_default(),
        Field::Budget => row
            .budget
            .and_then(|id| reference.budget(id))
            .map(|budget| budget.name.clone())
            .unwrap_or_default(),
        Field::Category => row.category_label(),
    }
}

/// The budgets that may be chosen for the row: those of its week owned by
/// the owner of its account.
fn budget_options(row: &Row, reference: &ReferenceData) -> Vec<SelectOption> {
    let Some(date) = row.date else {
        return Vec::new();
    };

    reference
        .budgets_for_week(week_of(date))
        .iter()
        .filter(|budget| budget_is_valid(row, budget.id, reference))
        .map(|budget| SelectOption {
            value: budget.id,
            label: budget.name.clone(),
        })
        .collect()
}

/// Leaf categories only, labelled with their parent.
fn category_options(reference: &ReferenceData) -> Vec<SelectOption> {
    let categories = reference.categories();

    categories
        .leaves()
        .into_iter()
        .map(|category| {
            let parent_name = categories.parent_name(category);
            let label = if parent_name.is_empty() {
                category.name.clone()
            } else {
                format!("{parent_name} / {}", category.name)
            };

            SelectOption {
                value: category.id,
                label,
            }
        })
        .collect()
}

fn editable_cell(row_id: RowId, input: CellInput, invalid: bool) -> Markup {
    let field = input.field();
    let endpoint = format_endpoint(endpoints::GRID_ROW_FIELD, row_id);
    let hx_vals = format!(r#"{{"field": "{}"}}"#, field.name());
    let style = if invalid {
        format!("{FORM_TEXT_INPUT_STYLE} {FORM_INPUT_INVALID_STYLE}")
    } else {
        FORM_TEXT_INPUT_STYLE.to_owned()
    };

    html! {
        td class="px-2 py-2" data-field=(field.name())
        {
            @match input {
                CellInput::Date(date) => {
                    input
                        type="date"
                        name="value"
                        aria-label=(field.label())
                        aria-invalid=[invalid.then_some("true")]
                        data-field=(field.name())
                        value=[date]
                        class=(style)
                        hx-put=(endpoint)
                        hx-vals=(hx_vals)
                        hx-trigger="change"
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                        hx-sync="closest tr:queue all"
                        hx-target-error="#alert-container";
                }
                CellInput::Amount(amount) => {
                    input
                        type="text"
                        inputmode="decimal"
                        name="value"
                        placeholder="0.00"
                        aria-label=(field.label())
                        aria-invalid=[invalid.then_some("true")]
                        data-field=(field.name())
                        value=[amount.map(|amount| format!("{amount:.2}"))]
                        class=(style)
                        hx-put=(endpoint)
                        hx-vals=(hx_vals)
                        hx-trigger="change"
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                        hx-sync="closest tr:queue all"
                        hx-target-error="#alert-container";
                }
                CellInput::Select { field, options, selected } => {
                    select
                        name="value"
                        aria-label=(field.label())
                        aria-invalid=[invalid.then_some("true")]
                        data-field=(field.name())
                        class=(style)
                        hx-put=(endpoint)
                        hx-vals=(hx_vals)
                        hx-trigger="change"
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                        hx-sync="closest tr:queue all"
                        hx-target-error="#alert-container"
                    {
                        option value="" selected[selected.is_none()]
                        {
                            @if field.is_required() { "Select..." } @else { "None" }
                        }

                        @for choice in options {
                            option value=(choice.value) selected[selected == Some(choice.value)]
                            {
                                (choice.label)
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        account::{Account, create_account},
        api::SqliteApi,
        budget::Budget,
        category::{Category, CategoryKind, CategoryTree, create_category},
        date_range::week_bounds,
        grid::{EditSession, Field, reference::ReferenceData},
        initialize_db,
        transaction::{TransactionDraft, upsert_transaction},
        user::{UserId, create_user},
    };

    use super::{Cell, CellInput, SelectOption, budget_options};

    fn reference() -> ReferenceData {
        let mut reference = ReferenceData::new(
            vec![
                Account {
                    id: 1,
                    name: "Everyday".to_owned(),
                    owner: UserId::new(1),
                },
                Account {
                    id: 2,
                    name: "Joint".to_owned(),
                    owner: UserId::new(2),
                },
            ],
            CategoryTree::new(vec![
                Category {
                    id: 1,
                    name: "Food".to_owned(),
                    parent_id: None,
                    kind: CategoryKind::Expense,
                },
                Category {
                    id: 2,
                    name: "Groceries".to_owned(),
                    parent_id: Some(1),
                    kind: CategoryKind::Expense,
                },
            ]),
        );
        reference.insert_week(
            date!(2024 - 06 - 03),
            vec![
                Budget {
                    id: 10,
                    name: "Food".to_owned(),
                    owner: UserId::new(1),
                    week_start: date!(2024 - 06 - 03),
                    amount: 100.0,
                },
                Budget {
                    id: 11,
                    name: "Shared".to_owned(),
                    owner: UserId::new(2),
                    week_start: date!(2024 - 06 - 03),
                    amount: 50.0,
                },
            ],
        );

        reference
    }

    #[test]
    fn budget_options_follow_account_owner() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));
        let mut row = session.get(row_id).unwrap().row().clone();
        row.account = Some(2);

        let options = budget_options(&row, &reference());

        assert_eq!(
            options,
            vec![SelectOption {
                value: 11,
                label: "Shared".to_owned()
            }]
        );
    }

    #[test]
    fn draft_cells_are_editable_and_flag_missing_fields() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));
        let grid_row = session.get(row_id).unwrap();

        let cell = Cell::for_field(grid_row, Field::Amount, &reference(), "$");

        assert_eq!(
            cell,
            Cell::Editable {
                row_id,
                input: CellInput::Amount(None),
                invalid: true,
            }
        );
    }

    #[test]
    fn category_select_lists_leaves_with_parent() {
        let mut session = EditSession::new();
        let row_id = session.create_row(date!(2024 - 06 - 05));
        let grid_row = session.get(row_id).unwrap();

        let markup = Cell::for_field(grid_row, Field::Category, &reference(), "$").into_html();
        let html = Html::parse_fragment(&format!("<table><tr>{}</tr></table>", markup.into_string()));

        let options = html
            .select(&Selector::parse("option").unwrap())
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(options, vec!["Select...", "Food / Groceries"]);
        let select = html.select(&Selector::parse("select").unwrap()).next().unwrap();
        assert_eq!(select.value().attr("hx-vals"), Some(r#"{"field": "category"}"#));
        assert_eq!(select.value().attr("aria-invalid"), Some("true"));
    }

    #[test]
    fn saved_rows_are_read_only() {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        let user = create_user("Sam", &connection).unwrap();
        let account = create_account("Everyday", user.id, &connection).unwrap();
        let category = create_category("Rent", None, CategoryKind::Expense, &connection).unwrap();
        upsert_transaction(
            &TransactionDraft {
                id: None,
                date: date!(2024 - 06 - 05),
                amount: -12.5,
                account_id: account.id,
                budget_id: None,
                category_id: category.id,
            },
            &connection,
        )
        .unwrap();
        let api = SqliteApi::new(Arc::new(Mutex::new(connection)));
        let mut session = EditSession::new();
        session.open(week_bounds(date!(2024 - 06 - 05)), &api).unwrap();
        let grid_row = &session.rows()[0];

        let amount = Cell::for_field(grid_row, Field::Amount, session.reference(), "$");
        let account = Cell::for_field(grid_row, Field::Account, session.reference(), "$");

        assert_eq!(
            amount,
            Cell::ReadOnly {
                text: "-$12.50".to_owned()
            }
        );
        assert_eq!(
            account,
            Cell::ReadOnly {
                text: "Everyday".to_owned()
            }
        );
    }
}
