//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::{database, settings::DatabaseSettings},
    core::{account, entry, money::Amount},
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        ..DatabaseSettings::default()
    };
    database::init_db(&settings).await
}

/// Parses a test literal as an [`Amount`].
///
/// # Panics
/// Panics if the literal is malformed or outside the supported precision or magnitude.
#[must_use]
#[allow(clippy::expect_used)]
pub fn amount(value: &str) -> Amount {
    value.parse().expect("test amount within supported range")
}

/// Creates a test account with the given label.
pub async fn create_test_account(
    db: &DatabaseConnection,
    label: &str,
) -> Result<entities::account::Model> {
    account::create_account(db, label).await
}

/// Creates a test entry on an account.
pub async fn create_test_entry(
    db: &DatabaseConnection,
    account_id: i64,
    txid: &str,
    value: &str,
) -> Result<entities::ledger_entry::Model> {
    entry::create_entry(db, account_id, txid, amount(value)).await
}

/// Sets up a complete test environment with an account.
/// Returns (db, account) for common test scenarios.
pub async fn setup_with_account() -> Result<(DatabaseConnection, entities::account::Model)> {
    let db = setup_test_db().await?;
    let account = create_test_account(&db, "Test Account").await?;
    Ok((db, account))
}
