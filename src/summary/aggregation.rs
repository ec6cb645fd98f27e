//! Totals of transaction amounts by category, by period and by budget.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use time::Date;

use crate::{
    budget::{Budget, BudgetId},
    category::CategoryTree,
    date_range::{RangePreset, month_abbrev, month_bounds, week_of},
    transaction::Transaction,
};

/// The label for transactions whose category is not in the hierarchy.
pub const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// Which transactions a summary includes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    /// Money spent, shown as positive amounts.
    #[default]
    Expenses,
    /// Money earned.
    Income,
    /// Income minus expenses.
    Net,
}

impl ReportKind {
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Expenses => "Expenses",
            ReportKind::Income => "Income",
            ReportKind::Net => "Net",
        }
    }

    pub fn as_query_value(self) -> &'static str {
        match self {
            ReportKind::Expenses => "expenses",
            ReportKind::Income => "income",
            ReportKind::Net => "net",
        }
    }

    /// How much `amount` adds to the report, or `None` if the report
    /// excludes it.
    pub fn reported_amount(self, amount: f64) -> Option<f64> {
        match self {
            ReportKind::Expenses if amount < 0.0 => Some(-amount),
            ReportKind::Income if amount > 0.0 => Some(amount),
            ReportKind::Net => Some(amount),
            ReportKind::Expenses | ReportKind::Income => None,
        }
    }
}

/// The total for one leaf category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafTotal {
    pub name: String,
    pub total: f64,
}

/// The total for a top-level category and each of its leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
    pub leaves: Vec<LeafTotal>,
}

/// Sum the reported amounts by parent category, then by leaf, in
/// alphabetical order.
///
/// A category without a parent is grouped under its own name.
pub fn category_totals(
    transactions: &[Transaction],
    categories: &CategoryTree,
    report: ReportKind,
) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

    for transaction in transactions {
        let Some(amount) = report.reported_amount(transaction.amount) else {
            continue;
        };

        let (group, leaf) = match categories.get(transaction.category_id) {
            Some(category) => {
                let parent_name = categories.parent_name(category);
                let group = if parent_name.is_empty() {
                    category.name.clone()
                } else {
                    parent_name
                };

                (group, category.name.clone())
            }
            None => (
                UNCATEGORISED_LABEL.to_owned(),
                UNCATEGORISED_LABEL.to_owned(),
            ),
        };

        *groups.entry(group).or_default().entry(leaf).or_insert(0.0) += amount;
    }

    groups
        .into_iter()
        .map(|(name, leaves)| CategoryTotal {
            name,
            total: leaves.values().sum(),
            leaves: leaves
                .into_iter()
                .map(|(name, total)| LeafTotal { name, total })
                .collect(),
        })
        .collect()
}

/// The total for one week or month.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotal {
    /// The first day of the period.
    pub start: Date,
    pub label: String,
    pub total: f64,
}

/// Sum the reported amounts per week or month, in chronological order.
///
/// Periods without any reported transactions are left out.
pub fn period_totals(
    transactions: &[Transaction],
    preset: RangePreset,
    report: ReportKind,
) -> Vec<PeriodTotal> {
    let mut totals: BTreeMap<Date, f64> = BTreeMap::new();

    for transaction in transactions {
        let Some(amount) = report.reported_amount(transaction.amount) else {
            continue;
        };

        let start = match preset {
            RangePreset::Week => week_of(transaction.date),
            RangePreset::Month => month_bounds(transaction.date).start,
        };

        *totals.entry(start).or_insert(0.0) += amount;
    }

    totals
        .into_iter()
        .map(|(start, total)| PeriodTotal {
            start,
            label: period_label(start, preset),
            total,
        })
        .collect()
}

fn period_label(start: Date, preset: RangePreset) -> String {
    match preset {
        RangePreset::Week => format!("{} {}", start.day(), month_abbrev(start.month())),
        RangePreset::Month => format!("{} {}", month_abbrev(start.month()), start.year()),
    }
}

/// How much of a budget has been spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub budget_id: BudgetId,
    pub name: String,
    #[serde(serialize_with = "serialize_date")]
    pub week_start: Date,
    pub amount: f64,
    /// The expenses counted against the budget, as a positive number.
    pub spent: f64,
    /// Negative when the budget is overspent.
    pub remaining: f64,
}

/// Work out the spending against each budget from the transactions linked to it.
///
/// Refunds linked to a budget reduce the amount spent.
pub fn budget_breakdown(budgets: &[Budget], transactions: &[Transaction]) -> Vec<BudgetUsage> {
    budgets
        .iter()
        .map(|budget| {
            let spent: f64 = transactions
                .iter()
                .filter(|transaction| transaction.budget_id == Some(budget.id))
                .map(|transaction| -transaction.amount)
                .sum();

            BudgetUsage {
                budget_id: budget.id,
                name: budget.name.clone(),
                week_start: budget.week_start,
                amount: budget.amount,
                spent,
                remaining: budget.amount - spent,
            }
        })
        .collect()
}

/// A label and value series for a chart.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn from_categories(totals: &[CategoryTotal]) -> Self {
        Self {
            labels: totals.iter().map(|total| total.name.clone()).collect(),
            values: totals.iter().map(|total| total.total).collect(),
        }
    }

    pub fn from_periods(totals: &[PeriodTotal]) -> Self {
        Self {
            labels: totals.iter().map(|total| total.label.clone()).collect(),
            values: totals.iter().map(|total| total.total).collect(),
        }
    }
}

pub(super) fn serialize_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(date)
}
