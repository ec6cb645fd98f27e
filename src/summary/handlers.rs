//! Summary page and JSON handlers.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Serialize;
use time::Date;

use crate::{
    AppState, Error,
    api::{SqliteApi, TransactionApi},
    category::CategoryTree,
    date_range::{DateRange, RangePreset, range_label, week_of},
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    preferences::{PreferencesUpdate, ViewPreferences, apply_query, preferences_form},
    timezone::current_local_date,
};

use super::{
    aggregation::{
        BudgetUsage, CategoryTotal, ChartData, PeriodTotal, ReportKind, budget_breakdown,
        category_totals, period_totals, serialize_date,
    },
    tables::{budget_table, category_table, period_table},
};

/// The state needed for the summary page and JSON.
#[derive(Debug, Clone)]
pub struct SummaryState {
    pub api: SqliteApi,
    pub preferences: Arc<Mutex<ViewPreferences>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: SqliteApi::from_ref(state),
            preferences: state.preferences.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Category, period and budget totals for one date range.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub range: DateRange,
    pub report: ReportKind,
    pub categories: Vec<CategoryTotal>,
    pub periods: Vec<PeriodTotal>,
    pub budgets: Vec<BudgetUsage>,
}

/// The summary as returned by the JSON endpoint.
#[derive(Debug, Serialize)]
struct SummaryJson<'a> {
    report: ReportKind,
    #[serde(serialize_with = "serialize_date")]
    start: Date,
    #[serde(serialize_with = "serialize_date")]
    end: Date,
    categories: ChartData,
    periods: ChartData,
    budgets: &'a [BudgetUsage],
}

/// Fetch the transactions and budgets in `range` and total them.
///
/// Periods are weeks or months following `preset`.
///
/// # Errors
///
/// Returns [Error::Api] if the data could not be fetched.
pub fn load_summary<A>(
    api: &A,
    range: DateRange,
    report: ReportKind,
    preset: RangePreset,
) -> Result<Summary, Error>
where
    A: TransactionApi + ?Sized,
{
    let categories = CategoryTree::new(api.list_categories()?);
    let transactions = api.list_transactions(range)?;
    // A budget counts if its week overlaps the range.
    let budgets = api.list_budgets_for_week(week_of(range.start), range.end, None)?;

    Ok(Summary {
        range,
        report,
        categories: category_totals(&transactions, &categories, report),
        periods: period_totals(&transactions, preset, report),
        budgets: budget_breakdown(&budgets, &transactions),
    })
}

fn summary_for_request(
    state: &SummaryState,
    query: PreferencesUpdate,
) -> Result<(Summary, ViewPreferences, Date), Error> {
    let today = current_local_date(&state.local_timezone)?;
    let preferences = apply_query(&state.preferences, query)?;
    let summary = load_summary(
        &state.api,
        preferences.date_range(today),
        preferences.report,
        preferences.range,
    )?;

    Ok((summary, preferences, today))
}

/// Display the summary tables for the selected range.
pub async fn get_summary_page(
    State(state): State<SummaryState>,
    Query(query): Query<PreferencesUpdate>,
) -> Response {
    match summary_for_request(&state, query) {
        Ok((summary, preferences, today)) => {
            Html(summary_view(&summary, &preferences, today).into_string()).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// The summary's chart series as JSON, for a charting library.
pub async fn get_summary_json(
    State(state): State<SummaryState>,
    Query(query): Query<PreferencesUpdate>,
) -> Response {
    let summary = match summary_for_request(&state, query) {
        Ok((summary, _, _)) => summary,
        Err(error) => return error.into_alert_response(),
    };

    let json = SummaryJson {
        report: summary.report,
        start: summary.range.start,
        end: summary.range.end,
        categories: ChartData::from_categories(&summary.categories),
        periods: ChartData::from_periods(&summary.periods),
        budgets: &summary.budgets,
    };

    match serde_json::to_string(&json) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not serialize summary: {error}");
            Error::JSONSerializationError(error.to_string()).into_alert_response()
        }
    }
}

fn summary_view(summary: &Summary, preferences: &ViewPreferences, today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::SUMMARY_VIEW).into_html();
    let symbol = &preferences.currency_symbol;
    let json_url = format!(
        "{}?range={}&anchor={}&report={}",
        endpoints::SUMMARY_API,
        preferences.range.as_query_value(),
        summary.range.start,
        summary.report.as_query_value()
    );

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-8"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { (summary.report.label()) }
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            (range_label(summary.range))
                        }
                    }

                    (preferences_form(preferences, today, true))
                }

                div id="summary-chart" data-chart-url=(json_url) {}

                section class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "By Category" }
                    (category_table(&summary.categories, symbol))
                }

                section class="space-y-2"
                {
                    h2 class="text-lg font-semibold"
                    {
                        @match preferences.range {
                            RangePreset::Week => "By Week",
                            RangePreset::Month => "By Month",
                        }
                    }
                    (period_table(&summary.periods, symbol))
                }

                section class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Budgets" }
                    (budget_table(&summary.budgets, symbol))
                }
            }
        }
    };

    base("Summary", &content)
}
