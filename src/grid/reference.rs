//! Accounts, categories and budgets the grid looks up while editing rows.

use std::collections::BTreeMap;

use time::Date;

use crate::{
    account::{Account, AccountId},
    budget::{Budget, BudgetId},
    category::CategoryTree,
    user::UserId,
};

/// Reference data loaded when the grid is opened.
///
/// Budgets are kept per week, keyed by the week's Monday. Weeks outside the
/// grid's range are loaded on demand with [ReferenceData::insert_week].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    accounts: Vec<Account>,
    categories: CategoryTree,
    budgets: BTreeMap<Date, Vec<Budget>>,
}

impl ReferenceData {
    pub fn new(accounts: Vec<Account>, categories: CategoryTree) -> Self {
        Self {
            accounts,
            categories,
            budgets: BTreeMap::new(),
        }
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_owner(&self, id: AccountId) -> Option<UserId> {
        self.account(id).map(|account| account.owner)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    /// The budget candidates for the week starting on `week_start`, for any owner.
    ///
    /// Empty if the week has not been loaded.
    pub fn budgets_for_week(&self, week_start: Date) -> &[Budget] {
        self.budgets
            .get(&week_start)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_week(&self, week_start: Date) -> bool {
        self.budgets.contains_key(&week_start)
    }

    pub fn insert_week(&mut self, week_start: Date, budgets: Vec<Budget>) {
        self.budgets.insert(week_start, budgets);
    }

    /// Find a budget in any loaded week.
    pub fn budget(&self, id: BudgetId) -> Option<&Budget> {
        self.budgets
            .values()
            .flatten()
            .find(|budget| budget.id == id)
    }

    /// Every loaded budget, ordered by week.
    pub fn budgets(&self) -> impl Iterator<Item = &Budget> {
        self.budgets.values().flatten()
    }
}
