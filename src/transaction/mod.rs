//! Transaction management for the finance tracker.
//!
//! This module contains everything related to storing transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating and editing transactions
//! - The `Kind` of a transaction, income or expense
//! - Database functions for storing, querying, and deleting transactions

mod core;
mod kind;

pub use core::{
    Transaction, TransactionBuilder, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, list_transactions,
    list_transactions_in_range, map_transaction_row, update_transaction,
};
pub use kind::Kind;
