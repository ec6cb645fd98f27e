//! Table views for the summary page.

use maud::{Markup, html};

use crate::{
    date_range::{range_label, week_bounds},
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
};

use super::aggregation::{BudgetUsage, CategoryTotal, PeriodTotal};

const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";
const AMOUNT_CELL_STYLE: &str = "px-4 py-3 text-right tabular-nums";
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        TABLE_CELL_GREEN_STYLE
    } else {
        TABLE_CELL_RED_STYLE
    }
}

fn empty_row(columns: u8, message: &str) -> Markup {
    html! {
        tr
        {
            td colspan=(columns) class="px-4 py-4 text-center text-gray-500 dark:text-gray-400"
            {
                (message)
            }
        }
    }
}

/// Parent categories with their leaves indented below them.
pub(super) fn category_table(totals: &[CategoryTotal], currency_symbol: &str) -> Markup {
    html! {
        table class=(TABLE_STYLE) data-summary-table="categories"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(AMOUNT_CELL_STYLE) { "Total" }
                }
            }

            tbody
            {
                @for group in totals {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class="px-4 py-3 font-semibold text-gray-900 dark:text-white"
                        {
                            (group.name)
                        }
                        td class=(AMOUNT_CELL_STYLE) { (format_currency(group.total, currency_symbol)) }
                    }

                    @for leaf in &group.leaves {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class="px-4 py-2 pl-10" { (leaf.name) }
                            td class=(AMOUNT_CELL_STYLE) { (format_currency(leaf.total, currency_symbol)) }
                        }
                    }
                }

                @if totals.is_empty() {
                    (empty_row(2, "No transactions in this range."))
                }
            }
        }
    }
}

pub(super) fn period_table(totals: &[PeriodTotal], currency_symbol: &str) -> Markup {
    html! {
        table class=(TABLE_STYLE) data-summary-table="periods"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                    th scope="col" class=(AMOUNT_CELL_STYLE) { "Total" }
                }
            }

            tbody
            {
                @for period in totals {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            time datetime=(period.start) { (period.label) }
                        }
                        td class=(AMOUNT_CELL_STYLE) { (format_currency(period.total, currency_symbol)) }
                    }
                }

                @if totals.is_empty() {
                    (empty_row(2, "No transactions in this range."))
                }
            }
        }
    }
}

pub(super) fn budget_table(budgets: &[BudgetUsage], currency_symbol: &str) -> Markup {
    html! {
        table class=(TABLE_STYLE) data-summary-table="budgets"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Budget" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Week" }
                    th scope="col" class=(AMOUNT_CELL_STYLE) { "Budgeted" }
                    th scope="col" class=(AMOUNT_CELL_STYLE) { "Spent" }
                    th scope="col" class=(AMOUNT_CELL_STYLE) { "Remaining" }
                }
            }

            tbody
            {
                @for usage in budgets {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (usage.name) }
                        td class=(TABLE_CELL_STYLE) { (range_label(week_bounds(usage.week_start))) }
                        td class=(AMOUNT_CELL_STYLE) { (format_currency(usage.amount, currency_symbol)) }
                        td class=(AMOUNT_CELL_STYLE) { (format_currency(usage.spent, currency_symbol)) }
                        td class={ (AMOUNT_CELL_STYLE) " " (amount_color_class(usage.remaining)) }
                        {
                            (format_currency(usage.remaining, currency_symbol))
                        }
                    }
                }

                @if budgets.is_empty() {
                    (empty_row(5, "No budgets in this range."))
                }
            }
        }
    }
}
