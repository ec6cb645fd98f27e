//! The currency, report and date range choices shared by the grid and the
//! summary page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRefresh;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    date_range::{DateRange, RangePreset, compute_range, parse_date},
    endpoints,
    html::FORM_TEXT_INPUT_STYLE,
    summary::ReportKind,
};

/// How the grid and summary are displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPreferences {
    /// Shown before every amount, e.g. "$".
    pub currency_symbol: String,
    pub report: ReportKind,
    pub range: RangePreset,
    /// The date the range is built around, `None` for today.
    pub anchor: Option<Date>,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_owned(),
            report: ReportKind::default(),
            range: RangePreset::default(),
            anchor: None,
        }
    }
}

/// Changes to [ViewPreferences]. Fields left as `None` are not changed.
///
/// Used for both the preferences form and the query string of the grid and
/// summary pages.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub currency_symbol: Option<String>,
    pub report: Option<ReportKind>,
    pub range: Option<RangePreset>,
    /// A `YYYY-MM-DD` date. An empty string resets the anchor to today.
    pub anchor: Option<String>,
}

impl ViewPreferences {
    /// Apply the fields set in `update`.
    ///
    /// Nothing is changed if any field is invalid.
    ///
    /// # Errors
    ///
    /// - [Error::EmptyCurrencySymbol] if the currency symbol is blank.
    /// - [Error::InvalidDate] if the anchor is not a valid date.
    pub fn apply(&mut self, update: PreferencesUpdate) -> Result<(), Error> {
        let currency_symbol = match update.currency_symbol {
            Some(symbol) if symbol.trim().is_empty() => return Err(Error::EmptyCurrencySymbol),
            Some(symbol) => Some(symbol.trim().to_owned()),
            None => None,
        };

        let anchor = match update.anchor.as_deref().map(str::trim) {
            Some("") => Some(None),
            Some(text) => Some(Some(parse_date(text)?)),
            None => None,
        };

        if let Some(symbol) = currency_symbol {
            self.currency_symbol = symbol;
        }
        if let Some(report) = update.report {
            self.report = report;
        }
        if let Some(range) = update.range {
            self.range = range;
        }
        if let Some(anchor) = anchor {
            self.anchor = anchor;
        }

        Ok(())
    }

    /// The selected range, built around the anchor date or `today`.
    pub fn date_range(&self, today: Date) -> DateRange {
        compute_range(self.range, self.anchor.unwrap_or(today))
    }
}

/// The state needed to update the view preferences.
#[derive(Debug, Clone)]
pub struct PreferencesState {
    pub preferences: Arc<Mutex<ViewPreferences>>,
}

impl FromRef<AppState> for PreferencesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            preferences: state.preferences.clone(),
        }
    }
}

/// Apply the submitted preferences and ask HTMX to reload the page.
pub async fn update_preferences_endpoint(
    State(state): State<PreferencesState>,
    Form(update): Form<PreferencesUpdate>,
) -> Response {
    let mut preferences = match state.preferences.lock() {
        Ok(preferences) => preferences,
        Err(error) => {
            tracing::error!("could not acquire preferences lock: {error}");
            return Error::PreferencesLockError.into_alert_response();
        }
    };

    match preferences.apply(update) {
        Ok(()) => {
            tracing::debug!("updated view preferences: {:?}", *preferences);
            (HxRefresh(true), StatusCode::OK).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Take a copy of the preferences after applying the changes in a page's
/// query string.
pub(crate) fn apply_query(
    preferences: &Mutex<ViewPreferences>,
    query: PreferencesUpdate,
) -> Result<ViewPreferences, Error> {
    let mut preferences = preferences
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire preferences lock: {error}"))
        .map_err(|_| Error::PreferencesLockError)?;

    preferences.apply(query)?;

    Ok(preferences.clone())
}

/// The controls for the date range and currency, plus the report kind when
/// `show_report` is set.
pub fn preferences_form(preferences: &ViewPreferences, today: Date, show_report: bool) -> Markup {
    let anchor = preferences.anchor.unwrap_or(today).to_string();

    html! {
        form
            hx-post=(endpoints::PREFERENCES_API)
            hx-trigger="change"
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4 text-sm"
        {
            label class="flex flex-col gap-1"
            {
                "Range"
                select name="range" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for preset in [RangePreset::Week, RangePreset::Month] {
                        option
                            value=(preset.as_query_value())
                            selected[preset == preferences.range]
                        {
                            (preset.label())
                        }
                    }
                }
            }

            label class="flex flex-col gap-1"
            {
                "Showing"
                input type="date" name="anchor" value=(anchor) class=(FORM_TEXT_INPUT_STYLE);
            }

            @if show_report {
                label class="flex flex-col gap-1"
                {
                    "Report"
                    select name="report" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for report in [ReportKind::Expenses, ReportKind::Income, ReportKind::Net] {
                            option
                                value=(report.as_query_value())
                                selected[report == preferences.report]
                            {
                                (report.label())
                            }
                        }
                    }
                }
            }

            label class="flex flex-col gap-1 w-20"
            {
                "Currency"
                input
                    type="text"
                    name="currency_symbol"
                    value=(preferences.currency_symbol)
                    required
                    maxlength="4"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}
