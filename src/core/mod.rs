//! Core ledger logic - framework-agnostic account and entry operations.
//!
//! Every mutating operation here runs as a single database transaction and routes its balance
//! effect through [`balance::apply`], the sole writer of account balances.

/// Account creation, lookup, renaming, deletion and reconciliation
pub mod account;
/// Balance mutator and account locking
pub mod balance;
/// Entry write paths (create, amend, remove) and lookups
pub mod entry;
/// Filtered and sorted entry listing
pub mod listing;
/// Exact decimal amount type
pub mod money;
/// Caller-side retry policy for transient conflicts
pub mod retry;
