//! Route handlers for the transaction grid.
//!
//! Row handlers respond with the row's new markup, to be swapped in place of
//! the row. A row that leaves the grid is answered with an empty body so
//! HTMX removes it. Problems with a row that the user can fix are reported
//! as an out-of-band alert next to the updated row.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    api::{ApiError, SqliteApi, TransactionApi},
    preferences::{PreferencesUpdate, ViewPreferences, apply_query},
    timezone::current_local_date,
};

use super::{
    row::{Field, FieldChange, RowId},
    session::{
        CancelOutcome, DeleteOutcome, EditSession, KeyAction, RowState, SaveOutcome, SaveRequest,
    },
    view::{grid_page, row_view, row_view_oob},
};

/// The state needed by the grid's route handlers.
#[derive(Debug, Clone)]
pub struct GridState {
    pub session: Arc<Mutex<EditSession>>,
    pub api: SqliteApi,
    pub preferences: Arc<Mutex<ViewPreferences>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for GridState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            session: state.grid_session.clone(),
            api: SqliteApi::from_ref(state),
            preferences: state.preferences.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl GridState {
    fn lock_session(&self) -> Result<MutexGuard<'_, EditSession>, Error> {
        self.session
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire edit session lock: {error}"))
            .map_err(|_| Error::SessionLockError)
    }

    fn currency_symbol(&self) -> Result<String, Error> {
        self.preferences
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire preferences lock: {error}"))
            .map(|preferences| preferences.currency_symbol.clone())
            .map_err(|_| Error::PreferencesLockError)
    }
}

/// The markup for `row_id`, or nothing if the row has left the grid.
fn render_row(session: &EditSession, row_id: RowId, currency_symbol: &str) -> Markup {
    match session.get(row_id) {
        Some(grid_row) => row_view(grid_row, session.reference(), currency_symbol),
        None => html! {},
    }
}

fn fragment(markup: Markup) -> Response {
    Html(markup.into_string()).into_response()
}

/// The row's markup followed by an out-of-band alert.
fn fragment_with_alert(markup: Markup, alert: Alert) -> Response {
    fragment(html! {
        (markup)
        (alert.into_oob_markup())
    })
}

/// Display the grid for the selected date range.
///
/// The session is reloaded when the range changes, which discards any
/// unsaved drafts.
pub async fn get_transactions_page(
    State(state): State<GridState>,
    Query(query): Query<PreferencesUpdate>,
) -> Response {
    let today = match current_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let preferences = match apply_query(&state.preferences, query) {
        Ok(preferences) => preferences,
        Err(error) => return error.into_response(),
    };

    let mut session = match state.lock_session() {
        Ok(session) => session,
        Err(error) => return error.into_response(),
    };

    let range = preferences.date_range(today);
    if session.range() != Some(range) {
        if let Err(error) = session.open(range, &state.api) {
            tracing::error!("could not open the grid for {range:?}: {error}");
            return error.into_response();
        }
    }

    Html(grid_page(&session, &preferences, today).into_string()).into_response()
}

/// Start a new draft dated today at the top of the grid.
pub async fn create_row_endpoint(State(state): State<GridState>) -> Response {
    let result = current_local_date(&state.local_timezone).and_then(|today| {
        let currency_symbol = state.currency_symbol()?;
        let mut session = state.lock_session()?;

        if let Err(error) = session.ensure_budgets_loaded(today, &state.api) {
            // The budgets are fetched again on the next change to the row.
            tracing::warn!("could not load budgets for {today}: {error}");
        }

        let row_id = session.create_row(today);
        tracing::debug!("created draft row {row_id}");

        Ok(render_row(&session, row_id, &currency_symbol))
    });

    match result {
        Ok(markup) => fragment(markup),
        Err(error) => error.into_alert_response(),
    }
}

/// Put a row into edit mode.
pub async fn begin_edit_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    with_session(&state, |session, currency_symbol| {
        session.begin_edit(row_id)?;

        Ok(render_row(session, row_id, currency_symbol))
    })
}

/// The form data sent by an editable cell.
#[derive(Debug, Deserialize)]
pub struct FieldForm {
    pub field: Field,
    pub value: String,
}

/// Change one field of a row, responding with the row after the fields that
/// depend on it have been reset.
pub async fn change_field_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
    Form(form): Form<FieldForm>,
) -> Response {
    let result = state.currency_symbol().and_then(|currency_symbol| {
        let mut session = state.lock_session()?;
        apply_cell_value(&mut session, row_id, form.field, &form.value, &state.api)?;

        Ok(render_row(&session, row_id, &currency_symbol))
    });

    match result {
        Ok(markup) => fragment(markup),
        Err(error) => respond_to_row_error(&state, row_id, error),
    }
}

/// Parse and apply the value submitted by a cell.
///
/// A value that arrives after the row has left edit mode, such as the
/// `change` that follows Enter, is accepted when the row already holds it.
fn apply_cell_value(
    session: &mut EditSession,
    row_id: RowId,
    field: Field,
    value: &str,
    api: &SqliteApi,
) -> Result<(), Error> {
    let change = FieldChange::parse(field, value)?;
    let result = session.change_field(row_id, change, api).map(|_| ());

    match result {
        Err(Error::NotEditing(_))
            if session
                .get(row_id)
                .is_some_and(|grid_row| grid_row.row().holds(change)) =>
        {
            Ok(())
        }
        result => result,
    }
}

/// Save a row.
pub async fn save_row_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    match save_row(&state, row_id) {
        Ok((outcome, markup)) => respond_to_save(outcome, markup),
        Err(error) => respond_to_row_error(&state, row_id, error),
    }
}

/// Leave edit mode without saving.
pub async fn cancel_edit_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    with_session(&state, |session, currency_symbol| {
        let outcome = session.cancel_edit(row_id)?;
        if outcome == CancelOutcome::Removed {
            tracing::debug!("discarded draft row {row_id}");
        }

        Ok(render_row(session, row_id, currency_symbol))
    })
}

/// The key sent by a row's keydown trigger, e.g. "Enter", and the value of
/// the cell the key was pressed in, if any.
#[derive(Debug, Deserialize)]
pub struct KeyForm {
    pub key: String,
    pub field: Option<Field>,
    pub value: Option<String>,
}

/// Enter saves the row and moves editing to the next row, or starts editing
/// a row in read mode. Escape cancels the edit.
pub async fn keydown_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
    Form(form): Form<KeyForm>,
) -> Response {
    let action = KeyAction::from_key(&form.key);

    let row_state = match state.lock_session() {
        Ok(session) => session.get(row_id).map(|grid_row| grid_row.state()),
        Err(error) => return error.into_alert_response(),
    };

    match (action, row_state) {
        (_, None) => Error::RowNotFound(row_id).into_alert_response(),
        (KeyAction::CommitAndAdvance, Some(RowState::Read)) => {
            begin_edit_endpoint(State(state), Path(row_id)).await
        }
        (KeyAction::CommitAndAdvance, Some(_)) => {
            if let (Some(field), Some(value)) = (form.field, form.value.as_deref()) {
                let applied = state.lock_session().and_then(|mut session| {
                    apply_cell_value(&mut session, row_id, field, value, &state.api)
                });

                if let Err(error) = applied {
                    return respond_to_row_error(&state, row_id, error);
                }
            }

            commit_and_advance(&state, row_id)
        }
        (KeyAction::Cancel, Some(_)) => cancel_edit_endpoint(State(state), Path(row_id)).await,
        (KeyAction::Ignore, Some(_)) => {
            with_session(&state, |session, currency_symbol| {
                Ok(render_row(session, row_id, currency_symbol))
            })
        }
    }
}

/// Copy a row into a new draft, responding with the new row only so it can
/// be inserted after the source row.
pub async fn duplicate_row_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    with_session(&state, |session, currency_symbol| {
        let copy_id = session.duplicate(row_id)?;
        tracing::debug!("duplicated row {row_id} as {copy_id}");

        Ok(render_row(session, copy_id, currency_symbol))
    })
}

/// Ask the user to confirm deleting a row.
pub async fn request_delete_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    with_session(&state, |session, currency_symbol| {
        session.request_delete(row_id)?;

        Ok(render_row(session, row_id, currency_symbol))
    })
}

pub async fn cancel_delete_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    with_session(&state, |session, currency_symbol| {
        session.cancel_delete(row_id)?;

        Ok(render_row(session, row_id, currency_symbol))
    })
}

/// Delete a row after the user confirmed it.
///
/// The status code has to be 200 OK or HTMX will not remove the table row.
pub async fn confirm_delete_endpoint(
    State(state): State<GridState>,
    Path(row_id): Path<RowId>,
) -> Response {
    let result = state.currency_symbol().and_then(|currency_symbol| {
        let mut session = state.lock_session()?;
        let outcome = session.confirm_delete(row_id, &state.api)?;

        Ok((outcome, render_row(&session, row_id, &currency_symbol)))
    });

    match result {
        Ok((DeleteOutcome::Deleted, markup)) => {
            tracing::info!("deleted row {row_id}");
            fragment(markup)
        }
        Ok((DeleteOutcome::AlreadyDeleted, markup)) => fragment_with_alert(
            markup,
            Alert::ErrorSimple {
                message: "The transaction had already been deleted".to_owned(),
            },
        ),
        Ok((DeleteOutcome::Failed(error), markup)) => {
            let (_, alert) = Error::Api(error).into_alert();
            fragment_with_alert(markup, alert)
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Run `f` with the locked session and the currency symbol, responding with
/// its markup or an alert.
fn with_session<F>(state: &GridState, f: F) -> Response
where
    F: FnOnce(&mut EditSession, &str) -> Result<Markup, Error>,
{
    let result = state.currency_symbol().and_then(|currency_symbol| {
        let mut session = state.lock_session()?;
        f(&mut *session, &currency_symbol)
    });

    match result {
        Ok(markup) => fragment(markup),
        Err(error) => error.into_alert_response(),
    }
}

/// Save a row without holding the session lock during the API request.
///
/// Returns the outcome and the row's markup afterwards.
fn save_row(state: &GridState, row_id: RowId) -> Result<(SaveOutcome, Markup), Error> {
    let currency_symbol = state.currency_symbol()?;
    let SaveRequest { ticket, draft } = state.lock_session()?.begin_save(row_id)?;

    tracing::debug!("saving row {row_id}: {draft:?}");
    let result = state.api.create_or_update_transaction(&draft);

    let mut session = state.lock_session()?;
    let outcome = session.complete_save(ticket, result);

    Ok((outcome, render_row(&session, row_id, &currency_symbol)))
}

fn respond_to_save(outcome: SaveOutcome, markup: Markup) -> Response {
    match outcome {
        SaveOutcome::Saved | SaveOutcome::Discarded => fragment(markup),
        SaveOutcome::Rejected(error) => {
            let (_, alert) = Error::Api(error).into_alert();
            fragment_with_alert(markup, alert)
        }
        SaveOutcome::Removed => {
            let (_, alert) = Error::Api(ApiError::NotFound).into_alert();
            fragment_with_alert(markup, alert)
        }
    }
}

/// Missing fields and API failures leave the row in the grid, so the row is
/// re-rendered (with any invalid fields marked) and the alert is sent out of
/// band. The response has to be a 200 OK for HTMX to swap the row in.
fn respond_to_row_error(state: &GridState, row_id: RowId, error: Error) -> Response {
    if !matches!(error, Error::InvalidFields(_) | Error::Api(_)) {
        return error.into_alert_response();
    }

    let (_, alert) = error.into_alert();
    let markup = state.currency_symbol().and_then(|currency_symbol| {
        let session = state.lock_session()?;
        Ok(render_row(&session, row_id, &currency_symbol))
    });

    match markup {
        Ok(markup) => fragment_with_alert(markup, alert),
        Err(error) => error.into_alert_response(),
    }
}

/// Save the row, then put the next row into edit mode and send it out of
/// band.
fn commit_and_advance(state: &GridState, row_id: RowId) -> Response {
    let (outcome, markup) = match save_row(state, row_id) {
        Ok(saved) => saved,
        Err(error) => return respond_to_row_error(state, row_id, error),
    };

    if outcome != SaveOutcome::Saved {
        return respond_to_save(outcome, markup);
    }

    let next = state.currency_symbol().and_then(|currency_symbol| {
        let mut session = state.lock_session()?;
        let next = session.advance_from(row_id).and_then(|next_id| {
            session
                .get(next_id)
                .map(|grid_row| row_view_oob(grid_row, session.reference(), &currency_symbol))
        });

        Ok(next)
    });

    match next {
        Ok(Some(next)) => fragment(html! {
            (markup)
            (next)
        }),
        Ok(None) => fragment(markup),
        Err(error) => {
            tracing::error!("could not advance from row {row_id}: {error}");
            fragment(markup)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{ElementRef, Html, Selector};
    use time::macros::date;

    use crate::{
        AppState,
        account::{AccountId, create_account},
        budget::{BudgetId, create_budget},
        build_router,
        category::{CategoryId, CategoryKind, create_category},
        date_range::week_bounds,
        endpoints::{self, format_endpoint},
        transaction::{Transaction, TransactionDraft, list_transactions_in_range, upsert_transaction},
        user::create_user,
    };

    struct TestApp {
        server: TestServer,
        db_connection: Arc<Mutex<Connection>>,
        account_id: AccountId,
        category_id: CategoryId,
        budget_id: BudgetId,
    }

    impl TestApp {
        fn transactions(&self) -> Vec<Transaction> {
            let connection = self.db_connection.lock().unwrap();
            list_transactions_in_range(week_bounds(date!(2024 - 06 - 03)), &connection)
                .unwrap()
                .into_iter()
                .chain(
                    list_transactions_in_range(week_bounds(date!(2024 - 06 - 10)), &connection)
                        .unwrap(),
                )
                .collect()
        }

        /// Open the grid on the week of 3 June 2024.
        async fn open_grid(&self) -> Vec<u64> {
            let response = self
                .server
                .get(endpoints::TRANSACTIONS_VIEW)
                .add_query_param("range", "week")
                .add_query_param("anchor", "2024-06-04")
                .await;
            response.assert_status_ok();

            row_ids(&Html::parse_document(&response.text()))
        }

        async fn set_field(&self, row_id: u64, field: &str, value: &str) -> Html {
            let response = self
                .server
                .put(&format_endpoint(endpoints::GRID_ROW_FIELD, row_id))
                .form(&[("field", field), ("value", value)])
                .await;
            response.assert_status_ok();

            parse_rows(&response.text())
        }

        async fn post(&self, endpoint: &str, row_id: u64) -> axum_test::TestResponse {
            self.server.post(&format_endpoint(endpoint, row_id)).await
        }
    }

    /// A database with two transactions in the week of 3 June 2024, the first
    /// linked to a budget.
    fn get_test_app() -> TestApp {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "Etc/UTC").unwrap();
        let db_connection = state.db_connection.clone();

        let (account_id, category_id, budget_id) = {
            let connection = db_connection.lock().unwrap();
            let user = create_user("Sam", &connection).unwrap();
            let account = create_account("Everyday", user.id, &connection).unwrap();
            let food = create_category("Food", None, CategoryKind::Expense, &connection).unwrap();
            let groceries =
                create_category("Groceries", Some(food.id), CategoryKind::Expense, &connection)
                    .unwrap();
            let budget =
                create_budget("Food", user.id, date!(2024 - 06 - 03), 100.0, &connection).unwrap();

            for (date, amount, budget_id) in [
                (date!(2024 - 06 - 03), -30.0, Some(budget.id)),
                (date!(2024 - 06 - 05), -20.0, None),
            ] {
                upsert_transaction(
                    &TransactionDraft {
                        id: None,
                        date,
                        amount,
                        account_id: account.id,
                        budget_id,
                        category_id: groceries.id,
                    },
                    &connection,
                )
                .unwrap();
            }

            (account.id, groceries.id, budget.id)
        };

        TestApp {
            server: TestServer::try_new(build_router(state)).expect("Could not create test server."),
            db_connection,
            account_id,
            category_id,
            budget_id,
        }
    }

    fn parse_rows(text: &str) -> Html {
        Html::parse_fragment(&format!("<table><tbody>{text}</tbody></table>"))
    }

    fn row_ids(html: &Html) -> Vec<u64> {
        html.select(&Selector::parse("tr[data-row-id]").unwrap())
            .filter_map(|row| row.value().attr("data-row-id")?.parse().ok())
            .collect()
    }

    #[track_caller]
    fn must_get_row(html: &Html) -> ElementRef<'_> {
        html.select(&Selector::parse("tr[data-row-id]").unwrap())
            .next()
            .expect("No row found")
    }

    fn row_state<'a>(row: &ElementRef<'a>) -> &'a str {
        row.value().attr("data-row-state").unwrap_or_default()
    }

    fn selected_value(html: &Html, label: &str) -> String {
        let selector = Selector::parse(&format!("select[aria-label={label}] option[selected]")).unwrap();

        html.select(&selector)
            .next()
            .and_then(|option| option.value().attr("value"))
            .unwrap_or_default()
            .to_owned()
    }

    fn has_oob_alert(html: &Html) -> bool {
        html.select(&Selector::parse("#alert-container[hx-swap-oob]").unwrap())
            .next()
            .is_some()
    }

    #[tokio::test]
    async fn grid_page_lists_transactions_in_range() {
        let app = get_test_app();

        let row_ids = app.open_grid().await;

        assert_eq!(row_ids.len(), 2);
    }

    #[tokio::test]
    async fn new_row_can_be_filled_in_and_saved() {
        let app = get_test_app();
        app.open_grid().await;

        let response = app.server.post(endpoints::GRID_ROWS).await;
        response.assert_status_ok();
        let html = parse_rows(&response.text());
        let row = must_get_row(&html);
        assert_eq!(row_state(&row), "edit");
        let row_id = row_ids(&html)[0];

        app.set_field(row_id, "date", "2024-06-04").await;
        app.set_field(row_id, "amount", "12.50").await;
        app.set_field(row_id, "account", &app.account_id.to_string()).await;
        let html = app
            .set_field(row_id, "category", &app.category_id.to_string())
            .await;
        assert_eq!(selected_value(&html, "Category"), app.category_id.to_string());

        let response = app.post(endpoints::GRID_ROW_SAVE, row_id).await;

        response.assert_status_ok();
        let html = parse_rows(&response.text());
        assert_eq!(row_state(&must_get_row(&html)), "read");
        let saved = app
            .transactions()
            .into_iter()
            .find(|transaction| transaction.date == date!(2024 - 06 - 04))
            .expect("transaction was not saved");
        assert_eq!(saved.amount, -12.5);
        assert_eq!(saved.account_id, app.account_id);
    }

    #[tokio::test]
    async fn saving_incomplete_row_marks_missing_fields() {
        let app = get_test_app();
        app.open_grid().await;
        let response = app.server.post(endpoints::GRID_ROWS).await;
        let row_id = row_ids(&parse_rows(&response.text()))[0];

        let response = app.post(endpoints::GRID_ROW_SAVE, row_id).await;

        response.assert_status_ok();
        let html = parse_rows(&response.text());
        assert_eq!(row_state(&must_get_row(&html)), "edit");
        let invalid = html
            .select(&Selector::parse("[aria-invalid=true]").unwrap())
            .filter_map(|element| element.value().attr("aria-label"))
            .collect::<Vec<_>>();
        assert_eq!(invalid, vec!["Amount", "Account", "Category"]);
        assert!(has_oob_alert(&html));
        assert_eq!(app.transactions().len(), 2);
    }

    #[tokio::test]
    async fn unparseable_value_is_rejected() {
        let app = get_test_app();
        app.open_grid().await;
        let response = app.server.post(endpoints::GRID_ROWS).await;
        let row_id = row_ids(&parse_rows(&response.text()))[0];

        let response = app
            .server
            .put(&format_endpoint(endpoints::GRID_ROW_FIELD, row_id))
            .form(&[("field", "amount"), ("value", "twelve")])
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn changing_week_clears_budget() {
        let app = get_test_app();
        let row_id = app.open_grid().await[0];
        let html = parse_rows(&app.post(endpoints::GRID_ROW_EDIT, row_id).await.text());
        assert_eq!(selected_value(&html, "Budget"), app.budget_id.to_string());

        let html = app.set_field(row_id, "date", "2024-06-10").await;
        assert_eq!(selected_value(&html, "Budget"), "");
        app.post(endpoints::GRID_ROW_SAVE, row_id)
            .await
            .assert_status_ok();

        let moved = app
            .transactions()
            .into_iter()
            .find(|transaction| transaction.date == date!(2024 - 06 - 10))
            .expect("transaction was not moved");
        assert_eq!(moved.budget_id, None);
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let app = get_test_app();
        let row_id = app.open_grid().await[0];
        let row_endpoint = format_endpoint(endpoints::GRID_ROW, row_id);

        app.server
            .delete(&row_endpoint)
            .await
            .assert_status(StatusCode::CONFLICT);
        let response = app.post(endpoints::GRID_ROW_DELETE_REQUEST, row_id).await;
        response.assert_status_ok();
        assert!(response.text().contains("Confirm"));

        let response = app.server.delete(&row_endpoint).await;

        response.assert_status_ok();
        assert_eq!(response.text(), "");
        assert_eq!(app.transactions().len(), 1);
    }

    #[tokio::test]
    async fn escape_discards_new_row() {
        let app = get_test_app();
        app.open_grid().await;
        let response = app.server.post(endpoints::GRID_ROWS).await;
        let row_id = row_ids(&parse_rows(&response.text()))[0];

        let response = app
            .server
            .post(&format_endpoint(endpoints::GRID_ROW_KEYDOWN, row_id))
            .form(&[("key", "Escape")])
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "");
        app.post(endpoints::GRID_ROW_EDIT, row_id)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn enter_saves_and_edits_next_row() {
        let app = get_test_app();
        let row_ids_before = app.open_grid().await;
        let (first, second) = (row_ids_before[0], row_ids_before[1]);
        app.post(endpoints::GRID_ROW_EDIT, first)
            .await
            .assert_status_ok();
        app.set_field(first, "amount", "45").await;

        let response = app
            .server
            .post(&format_endpoint(endpoints::GRID_ROW_KEYDOWN, first))
            .form(&[("key", "Enter")])
            .await;

        response.assert_status_ok();
        let html = parse_rows(&response.text());
        let rows = html
            .select(&Selector::parse("tr[data-row-id]").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert_eq!(row_state(&rows[0]), "read");
        assert_eq!(
            rows[1].value().attr("data-row-id"),
            Some(second.to_string().as_str())
        );
        assert_eq!(rows[1].value().attr("hx-swap-oob"), Some("true"));
        assert_eq!(row_state(&rows[1]), "edit");
        assert!(
            app.transactions()
                .iter()
                .any(|transaction| transaction.amount == -45.0)
        );
    }

    #[tokio::test]
    async fn enter_saves_the_value_typed_in_the_focused_cell() {
        let app = get_test_app();
        app.open_grid().await;
        let response = app.server.post(endpoints::GRID_ROWS).await;
        let row_id = row_ids(&parse_rows(&response.text()))[0];
        app.set_field(row_id, "date", "2024-06-04").await;
        app.set_field(row_id, "account", &app.account_id.to_string()).await;
        app.set_field(row_id, "category", &app.category_id.to_string())
            .await;

        let response = app
            .server
            .post(&format_endpoint(endpoints::GRID_ROW_KEYDOWN, row_id))
            .form(&[("key", "Enter"), ("field", "amount"), ("value", "12.50")])
            .await;

        response.assert_status_ok();
        let html = parse_rows(&response.text());
        assert_eq!(row_state(&must_get_row(&html)), "read");
        assert!(!has_oob_alert(&html));
        assert!(
            app.transactions()
                .iter()
                .any(|transaction| transaction.amount == -12.5)
        );

        // The browser's `change` for the same cell arrives after the save.
        let html = app.set_field(row_id, "amount", "12.50").await;
        assert_eq!(row_state(&must_get_row(&html)), "read");
    }

    #[tokio::test]
    async fn failed_budget_fetch_keeps_row_in_grid() {
        let app = get_test_app();
        let row_id = app.open_grid().await[0];
        app.post(endpoints::GRID_ROW_EDIT, row_id)
            .await
            .assert_status_ok();
        app.db_connection
            .lock()
            .unwrap()
            .execute("ALTER TABLE budget RENAME TO budget_old", ())
            .unwrap();

        let response = app
            .server
            .put(&format_endpoint(endpoints::GRID_ROW_FIELD, row_id))
            .form(&[("field", "date"), ("value", "2024-07-01")])
            .await;

        response.assert_status_ok();
        let html = parse_rows(&response.text());
        assert_eq!(row_ids(&html), vec![row_id]);
        assert_eq!(row_state(&must_get_row(&html)), "edit");
        assert!(has_oob_alert(&html));
        let date_input = html
            .select(&Selector::parse("input[type=date]").unwrap())
            .next()
            .expect("No date input");
        assert_eq!(date_input.value().attr("value"), Some("2024-06-03"));
    }

    #[tokio::test]
    async fn enter_on_read_row_starts_editing() {
        let app = get_test_app();
        let row_id = app.open_grid().await[0];

        let response = app
            .server
            .post(&format_endpoint(endpoints::GRID_ROW_KEYDOWN, row_id))
            .form(&[("key", "Enter")])
            .await;

        response.assert_status_ok();
        assert_eq!(
            row_state(&must_get_row(&parse_rows(&response.text()))),
            "edit"
        );
    }

    #[tokio::test]
    async fn duplicate_returns_new_draft() {
        let app = get_test_app();
        let row_id = app.open_grid().await[0];

        let response = app.post(endpoints::GRID_ROW_DUPLICATE, row_id).await;

        response.assert_status_ok();
        let html = parse_rows(&response.text());
        let copy_id = row_ids(&html)[0];
        assert_ne!(copy_id, row_id);
        assert_eq!(row_state(&must_get_row(&html)), "edit");
        assert_eq!(selected_value(&html, "Budget"), app.budget_id.to_string());
        assert_eq!(app.transactions().len(), 2);
    }
}
