//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod ledger_entry;

// Re-export specific types to avoid conflicts
pub use account::{Entity as Account, Model as AccountModel};
pub use ledger_entry::{Entity as LedgerEntry, Model as LedgerEntryModel};
