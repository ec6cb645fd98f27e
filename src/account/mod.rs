//! Accounts hold money for a single user, e.g. a bank account or credit card.

mod core;

pub use core::{Account, AccountId, create_account, create_account_table, list_accounts};
