//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables and indexes are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs. Creation is
//! idempotent, which lets the binary open an existing database file on every run.

use crate::config::settings::DatabaseSettings;
use crate::entities::{Account, LedgerEntry};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, ConnectOptions, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// True for `SQLite` URLs that address a private in-memory database.
///
/// Every pooled connection to such a URL would see its own empty database, so these URLs are
/// always opened with a single connection.
#[must_use]
pub fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && url.contains(":memory:")
}

/// Filesystem path of a file-backed `SQLite` URL, without query parameters.
fn sqlite_file_path(url: &str) -> Option<&Path> {
    if is_in_memory(url) {
        return None;
    }
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then(|| Path::new(path))
}

/// Establishes a connection pool described by the settings.
///
/// For file-backed `SQLite` the parent directory is created first.
pub async fn create_connection(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(&settings.url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let max_connections = if is_in_memory(&settings.url) {
        1
    } else {
        settings.max_connections
    };

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .sqlx_logging(false);

    debug!(max_connections, "Connecting to database");
    Database::connect(options).await.map_err(Into::into)
}

/// Creates all necessary tables and indexes if they do not exist yet.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut account_table = schema.create_table_from_entity(Account);
    account_table.if_not_exists();
    let mut entry_table = schema.create_table_from_entity(LedgerEntry);
    entry_table.if_not_exists();

    db.execute(builder.build(&account_table)).await?;
    db.execute(builder.build(&entry_table)).await?;

    let indexes = schema
        .create_index_from_entity(Account)
        .into_iter()
        .chain(schema.create_index_from_entity(LedgerEntry));
    for mut index in indexes {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables ensured.");
    Ok(())
}

/// Connects and ensures the schema exists.
pub async fn init_db(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    let db = create_connection(settings).await?;
    create_tables(&db).await?;
    Ok(db)
}
