//! The edit session: which rows are being edited, saved or deleted, and the
//! requests sent to the persistence API on their behalf.
//!
//! Each row moves between three states:
//!
//! ```text
//! Read --begin_edit--> Edit --begin_save--> Saving --complete_save--> Read
//!                       ^ |                        |
//!                       | +--cancel_edit--> Read   +--(rejected)--> Edit
//!                       +--------------------------+
//! ```
//!
//! Saving is split into [EditSession::begin_save] and
//! [EditSession::complete_save] so callers can release the session while the
//! API request is in flight. Each save is stamped with a generation number,
//! and a completion whose ticket no longer matches the row is discarded.

use time::Date;

use crate::{
    Error,
    api::{ApiError, TransactionApi},
    category::CategoryTree,
    date_range::{DateRange, week_bounds, week_of, weeks_in},
    transaction::{Transaction, TransactionDraft},
};

use super::{
    reference::ReferenceData,
    resolver::{apply_change, budget_is_valid},
    row::{Field, FieldChange, FieldSet, Row, RowId},
    validation::{invalid_fields, is_valid},
};

/// Whether a row is being displayed, edited or saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Read,
    Edit,
    Saving,
}

impl RowState {
    pub fn as_str(self) -> &'static str {
        match self {
            RowState::Read => "read",
            RowState::Edit => "edit",
            RowState::Saving => "saving",
        }
    }
}

/// A row together with its edit state.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    row: Row,
    state: RowState,
    /// The row as it was when editing began, restored on cancel.
    snapshot: Option<Row>,
    invalid: FieldSet,
    delete_requested: bool,
    /// Why the last save or delete failed.
    message: Option<String>,
    save_generation: u64,
}

impl GridRow {
    fn read(row: Row) -> Self {
        Self {
            row,
            state: RowState::Read,
            snapshot: None,
            invalid: FieldSet::new(),
            delete_requested: false,
            message: None,
            save_generation: 0,
        }
    }

    fn draft(row: Row) -> Self {
        let invalid = invalid_fields(&row);

        Self {
            snapshot: Some(row.clone()),
            row,
            state: RowState::Edit,
            invalid,
            delete_requested: false,
            message: None,
            save_generation: 0,
        }
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn id(&self) -> RowId {
        self.row.id
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn invalid_fields(&self) -> &FieldSet {
        &self.invalid
    }

    pub fn is_delete_requested(&self) -> bool {
        self.delete_requested
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether the row has never been saved.
    pub fn is_draft(&self) -> bool {
        self.row.transaction_id.is_none()
    }
}

/// Identifies one save of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    pub row_id: RowId,
    generation: u64,
}

/// A save that has been started and must be sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub ticket: SaveTicket,
    pub draft: TransactionDraft,
}

/// What happened when the API responded to a save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The row shows the stored record.
    Saved,
    /// The row is back in edit mode with the error as its message.
    Rejected(ApiError),
    /// The transaction no longer exists, so the row was removed.
    Removed,
    /// The row was removed or saved again while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The row shows the values it had before editing.
    Restored,
    /// The row was a draft that was never saved, so it was removed.
    Removed,
    /// The row was not being edited.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The transaction was deleted and the row removed.
    Deleted,
    /// The transaction was already gone. The row was removed.
    AlreadyDeleted,
    /// The API refused the delete. The row keeps its state.
    Failed(ApiError),
}

/// What a key press on a row maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Save the row and move to the next one.
    CommitAndAdvance,
    /// Discard the changes to the row.
    Cancel,
    Ignore,
}

impl KeyAction {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Self {
        match key {
            "Enter" => KeyAction::CommitAndAdvance,
            "Escape" => KeyAction::Cancel,
            _ => KeyAction::Ignore,
        }
    }
}

/// The result of a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// The row was saved. `next` is the row now being edited, if any.
    Committed {
        outcome: SaveOutcome,
        next: Option<RowId>,
    },
    /// The row was in read mode and is now being edited.
    EditStarted,
    Cancelled(CancelOutcome),
    Ignored,
}

/// The rows of the grid and their edit states.
#[derive(Debug, Default)]
pub struct EditSession {
    range: Option<DateRange>,
    reference: ReferenceData,
    rows: Vec<GridRow>,
    next_row_id: RowId,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the reference data and the transactions dated within `range`,
    /// replacing every row in the session.
    ///
    /// Row IDs keep counting up, so IDs from before the session was reopened
    /// are never reused.
    ///
    /// # Errors
    ///
    /// Returns [Error::Api] if any of the API requests fail, in which case the
    /// session is left unchanged.
    pub fn open<A>(&mut self, range: DateRange, api: &A) -> Result<(), Error>
    where
        A: TransactionApi + ?Sized,
    {
        let accounts = api.list_accounts()?;
        let categories = CategoryTree::new(api.list_categories()?);
        let mut reference = ReferenceData::new(accounts, categories);

        for week_start in weeks_in(range) {
            let week = week_bounds(week_start);
            let budgets = api.list_budgets_for_week(week.start, week.end, None)?;
            reference.insert_week(week_start, budgets);
        }

        let transactions = api.list_transactions(range)?;
        let rows = transactions
            .iter()
            .map(|transaction| {
                let id = self.next_row_id();
                GridRow::read(Row::from_transaction(id, transaction, reference.categories()))
            })
            .collect();

        tracing::debug!(
            "opened grid for {} to {} with {} transactions",
            range.start,
            range.end,
            transactions.len()
        );

        self.range = Some(range);
        self.reference = reference;
        self.rows = rows;

        Ok(())
    }

    /// The date range of the transactions loaded by [EditSession::open].
    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// The rows in grid order.
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn get(&self, row_id: RowId) -> Option<&GridRow> {
        self.rows.iter().find(|grid_row| grid_row.id() == row_id)
    }

    fn get_mut(&mut self, row_id: RowId) -> Result<&mut GridRow, Error> {
        self.rows
            .iter_mut()
            .find(|grid_row| grid_row.id() == row_id)
            .ok_or(Error::RowNotFound(row_id))
    }

    fn position(&self, row_id: RowId) -> Result<usize, Error> {
        self.rows
            .iter()
            .position(|grid_row| grid_row.id() == row_id)
            .ok_or(Error::RowNotFound(row_id))
    }

    fn remove(&mut self, row_id: RowId) {
        self.rows.retain(|grid_row| grid_row.id() != row_id);
    }

    /// Allocate an ID for a new row.
    pub fn next_row_id(&mut self) -> RowId {
        self.next_row_id += 1;
        self.next_row_id
    }

    /// Fetch the budgets for the week starting on `week_start` unless they
    /// are already loaded.
    ///
    /// # Errors
    ///
    /// Returns [Error::Api] if the budgets could not be fetched.
    pub fn ensure_budgets_loaded<A>(&mut self, week_start: Date, api: &A) -> Result<(), Error>
    where
        A: TransactionApi + ?Sized,
    {
        let week_start = week_of(week_start);

        if self.reference.has_week(week_start) {
            return Ok(());
        }

        let week = week_bounds(week_start);
        let budgets = api.list_budgets_for_week(week.start, week.end, None)?;
        tracing::debug!("loaded {} budgets for week of {week_start}", budgets.len());
        self.reference.insert_week(week_start, budgets);

        Ok(())
    }

    /// Start a new draft at the top of the grid, dated `date`.
    pub fn create_row(&mut self, date: Date) -> RowId {
        let id = self.next_row_id();
        self.rows.insert(0, GridRow::draft(Row::empty(id, Some(date))));

        id
    }

    /// Put a row into edit mode. Rows already being edited are left as they are.
    ///
    /// # Errors
    ///
    /// - [Error::RowNotFound] if the row is not in the grid.
    /// - [Error::SaveInProgress] if the row is being saved.
    pub fn begin_edit(&mut self, row_id: RowId) -> Result<&GridRow, Error> {
        let grid_row = self.get_mut(row_id)?;

        match grid_row.state {
            RowState::Saving => return Err(Error::SaveInProgress(row_id)),
            RowState::Edit => {}
            RowState::Read => {
                grid_row.snapshot = Some(grid_row.row.clone());
                grid_row.invalid = invalid_fields(&grid_row.row);
                grid_row.state = RowState::Edit;
                grid_row.delete_requested = false;
                grid_row.message = None;
            }
        }

        Ok(grid_row)
    }

    /// Change one field of a row in edit mode, clearing the fields that the
    /// change invalidates.
    ///
    /// The budgets for the row's new week are fetched first if they are not
    /// loaded yet.
    ///
    /// # Errors
    ///
    /// - [Error::RowNotFound] if the row is not in the grid.
    /// - [Error::NotEditing] if the row is in read mode.
    /// - [Error::SaveInProgress] if the row is being saved.
    /// - [Error::Api] if the budgets could not be fetched. The row is unchanged.
    pub fn change_field<A>(
        &mut self,
        row_id: RowId,
        change: FieldChange,
        api: &A,
    ) -> Result<&GridRow, Error>
    where
        A: TransactionApi + ?Sized,
    {
        let grid_row = self.get_mut(row_id)?;

        match grid_row.state {
            RowState::Read => return Err(Error::NotEditing(row_id)),
            RowState::Saving => return Err(Error::SaveInProgress(row_id)),
            RowState::Edit => {}
        }

        let date = match change {
            FieldChange::Date(date) => date,
            _ => grid_row.row.date,
        };

        if let Some(date) = date {
            self.ensure_budgets_loaded(date, api)?;
        }

        let reference = &self.reference;
        let grid_row = self
            .rows
            .iter_mut()
            .find(|grid_row| grid_row.id() == row_id)
            .ok_or(Error::RowNotFound(row_id))?;

        grid_row.row = apply_change(&grid_row.row, change, reference);
        grid_row.invalid = invalid_fields(&grid_row.row);

        Ok(grid_row)
    }

    /// Leave edit mode without saving.
    ///
    /// A draft that was never saved is removed. Otherwise the row goes back
    /// to the values it had before editing began. Rows that are not being
    /// edited, including rows being saved, are left alone.
    ///
    /// # Errors
    ///
    /// Returns [Error::RowNotFound] if the row is not in the grid.
    pub fn cancel_edit(&mut self, row_id: RowId) -> Result<CancelOutcome, Error> {
        let grid_row = self.get_mut(row_id)?;

        if grid_row.state != RowState::Edit {
            return Ok(CancelOutcome::Unchanged);
        }

        if grid_row.is_draft() {
            self.remove(row_id);
            return Ok(CancelOutcome::Removed);
        }

        if let Some(snapshot) = grid_row.snapshot.take() {
            grid_row.row = snapshot;
        }
        grid_row.state = RowState::Read;
        grid_row.invalid.clear();
        grid_row.delete_requested = false;
        grid_row.message = None;

        Ok(CancelOutcome::Restored)
    }

    /// Start saving a row, moving it to [RowState::Saving].
    ///
    /// The returned request must be sent to the API and its result passed to
    /// [EditSession::complete_save].
    ///
    /// # Errors
    ///
    /// - [Error::RowNotFound] if the row is not in the grid.
    /// - [Error::SaveInProgress] if the row is already being saved.
    /// - [Error::NotEditing] if the row is in read mode.
    /// - [Error::InvalidFields] if required fields are empty. The row stays in
    ///   edit mode with the fields marked invalid.
    pub fn begin_save(&mut self, row_id: RowId) -> Result<SaveRequest, Error> {
        let categories = self.reference.categories().clone();
        let grid_row = self.get_mut(row_id)?;

        match grid_row.state {
            RowState::Saving => return Err(Error::SaveInProgress(row_id)),
            RowState::Read => return Err(Error::NotEditing(row_id)),
            RowState::Edit => {}
        }

        grid_row.invalid = invalid_fields(&grid_row.row);
        if !is_valid(&grid_row.row) {
            return Err(Error::InvalidFields(grid_row.invalid.clone()));
        }

        let Some(draft) = grid_row.row.to_draft(&categories) else {
            // The category is set but not in the hierarchy any more.
            grid_row.row.clear(Field::Category);
            grid_row.invalid = invalid_fields(&grid_row.row);
            return Err(Error::InvalidFields(grid_row.invalid.clone()));
        };

        grid_row.state = RowState::Saving;
        grid_row.save_generation += 1;
        grid_row.message = None;

        Ok(SaveRequest {
            ticket: SaveTicket {
                row_id,
                generation: grid_row.save_generation,
            },
            draft,
        })
    }

    /// Apply the API's response to a save started by [EditSession::begin_save].
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<Transaction, ApiError>,
    ) -> SaveOutcome {
        let categories = self.reference.categories().clone();
        let Ok(grid_row) = self.get_mut(ticket.row_id) else {
            tracing::debug!("discarding save for row {} that left the grid", ticket.row_id);
            return SaveOutcome::Discarded;
        };

        if grid_row.state != RowState::Saving || grid_row.save_generation != ticket.generation {
            tracing::debug!("discarding stale save for row {}", ticket.row_id);
            return SaveOutcome::Discarded;
        }

        match result {
            Ok(transaction) => {
                grid_row.row = Row::from_transaction(ticket.row_id, &transaction, &categories);
                grid_row.state = RowState::Read;
                grid_row.snapshot = None;
                grid_row.invalid.clear();
                grid_row.delete_requested = false;
                grid_row.message = None;

                SaveOutcome::Saved
            }
            Err(ApiError::NotFound) => {
                tracing::info!(
                    "transaction for row {} no longer exists, removing it",
                    ticket.row_id
                );
                self.remove(ticket.row_id);

                SaveOutcome::Removed
            }
            Err(error) => {
                tracing::warn!("save of row {} was rejected: {error}", ticket.row_id);
                grid_row.state = RowState::Edit;
                grid_row.message = Some(error.to_string());

                SaveOutcome::Rejected(error)
            }
        }
    }

    /// Save a row, holding the session for the whole request.
    ///
    /// # Errors
    ///
    /// Returns the errors of [EditSession::begin_save]. API failures are
    /// reported through the [SaveOutcome].
    pub fn save<A>(&mut self, row_id: RowId, api: &A) -> Result<SaveOutcome, Error>
    where
        A: TransactionApi + ?Sized,
    {
        let request = self.begin_save(row_id)?;
        let result = api.create_or_update_transaction(&request.draft);

        Ok(self.complete_save(request.ticket, result))
    }

    /// Copy a row into a new draft directly below it, in edit mode.
    ///
    /// The budget is kept only if it is still a candidate for the copy.
    ///
    /// # Errors
    ///
    /// Returns [Error::RowNotFound] if the row is not in the grid.
    pub fn duplicate(&mut self, row_id: RowId) -> Result<RowId, Error> {
        let position = self.position(row_id)?;
        let id = self.next_row_id();

        let mut copy = Row {
            id,
            transaction_id: None,
            ..self.rows[position].row.clone()
        };

        if let Some(budget_id) = copy.budget {
            if !budget_is_valid(&copy, budget_id, &self.reference) {
                copy.budget = None;
            }
        }

        self.rows.insert(position + 1, GridRow::draft(copy));

        Ok(id)
    }

    /// Ask for confirmation before deleting a row.
    ///
    /// # Errors
    ///
    /// - [Error::RowNotFound] if the row is not in the grid.
    /// - [Error::SaveInProgress] if the row is being saved.
    pub fn request_delete(&mut self, row_id: RowId) -> Result<&GridRow, Error> {
        let grid_row = self.get_mut(row_id)?;

        if grid_row.state == RowState::Saving {
            return Err(Error::SaveInProgress(row_id));
        }

        grid_row.delete_requested = true;

        Ok(grid_row)
    }

    /// # Errors
    ///
    /// Returns [Error::RowNotFound] if the row is not in the grid.
    pub fn cancel_delete(&mut self, row_id: RowId) -> Result<&GridRow, Error> {
        let grid_row = self.get_mut(row_id)?;
        grid_row.delete_requested = false;

        Ok(grid_row)
    }

    /// Delete a row after [EditSession::request_delete].
    ///
    /// Drafts that were never saved are removed without contacting the API.
    ///
    /// # Errors
    ///
    /// - [Error::RowNotFound] if the row is not in the grid.
    /// - [Error::DeleteNotRequested] if the delete was not requested first.
    /// - [Error::SaveInProgress] if the row is being saved.
    pub fn confirm_delete<A>(&mut self, row_id: RowId, api: &A) -> Result<DeleteOutcome, Error>
    where
        A: TransactionApi + ?Sized,
    {
        let grid_row = self.get_mut(row_id)?;

        if !grid_row.delete_requested {
            return Err(Error::DeleteNotRequested(row_id));
        }

        if grid_row.state == RowState::Saving {
            return Err(Error::SaveInProgress(row_id));
        }

        let Some(transaction_id) = grid_row.row.transaction_id else {
            self.remove(row_id);
            return Ok(DeleteOutcome::Deleted);
        };

        match api.delete_transaction(transaction_id) {
            Ok(()) => {
                self.remove(row_id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(ApiError::NotFound) => {
                self.remove(row_id);
                Ok(DeleteOutcome::AlreadyDeleted)
            }
            Err(error) => {
                tracing::warn!("could not delete transaction {transaction_id}: {error}");
                let grid_row = self.get_mut(row_id)?;
                grid_row.delete_requested = false;
                grid_row.message = Some(error.to_string());

                Ok(DeleteOutcome::Failed(error))
            }
        }
    }

    /// Put the row after `row_id` into edit mode, returning its ID.
    ///
    /// Returns `None` if `row_id` is the last row or the next row is being saved.
    pub fn advance_from(&mut self, row_id: RowId) -> Option<RowId> {
        let position = self.position(row_id).ok()?;
        let next_id = self.rows.get(position + 1)?.id();

        self.begin_edit(next_id).ok().map(GridRow::id)
    }

    /// Handle a key press on a row: Enter saves the row and moves to the
    /// next one (or starts editing a row in read mode), Escape cancels.
    ///
    /// # Errors
    ///
    /// Returns the errors of [EditSession::begin_save] and
    /// [EditSession::begin_edit].
    pub fn on_key_down<A>(&mut self, row_id: RowId, key: &str, api: &A) -> Result<KeyOutcome, Error>
    where
        A: TransactionApi + ?Sized,
    {
        let state = self
            .get(row_id)
            .map(GridRow::state)
            .ok_or(Error::RowNotFound(row_id))?;

        match (KeyAction::from_key(key), state) {
            (KeyAction::CommitAndAdvance, RowState::Read) => {
                self.begin_edit(row_id)?;
                Ok(KeyOutcome::EditStarted)
            }
            (KeyAction::CommitAndAdvance, _) => {
                let outcome = self.save(row_id, api)?;
                let next = match outcome {
                    SaveOutcome::Saved => self.advance_from(row_id),
                    _ => None,
                };

                Ok(KeyOutcome::Committed { outcome, next })
            }
            (KeyAction::Cancel, _) => Ok(KeyOutcome::Cancelled(self.cancel_edit(row_id)?)),
            (KeyAction::Ignore, _) => Ok(KeyOutcome::Ignored),
        }
    }
}
