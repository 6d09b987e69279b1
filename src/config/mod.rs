/// Database connection and schema management
pub mod database;

/// Settings loading from ledger.toml and the environment
pub mod settings;
