//! Persisted transactions and the database queries for them.

mod core;

pub use core::{
    Transaction, TransactionDraft, TransactionId, create_transaction_table, delete_transaction,
    get_transaction, list_transactions_in_range, upsert_transaction,
};
