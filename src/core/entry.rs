//! Ledger entry business logic - the invariant-preserving write paths.
//!
//! Creating, amending and removing an entry each run as one database transaction:
//!
//! 1. lock the owning account ([`balance::lock_account`] / [`balance::lock_entry_account`]),
//! 2. compute the balance delta the mutation implies,
//! 3. hand the delta to [`balance::apply`], which refuses to drive the balance below zero,
//! 4. write the entry row and commit.
//!
//! Any error before the commit drops the transaction, which rolls back both the entry write and
//! the balance write. The same happens when the caller's future is cancelled mid-flight.

use crate::{
    core::{balance, money::Amount},
    entities::{LedgerEntry, ledger_entry},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Longest accepted transaction id, in characters.
pub const MAX_TXID_LEN: usize = 255;

fn validate_txid(txid: &str) -> Result<()> {
    if txid.trim().is_empty() {
        return Err(Error::InvalidTxid {
            reason: "txid cannot be empty".to_string(),
        });
    }
    if txid.chars().count() > MAX_TXID_LEN {
        return Err(Error::InvalidTxid {
            reason: format!("txid longer than {MAX_TXID_LEN} characters"),
        });
    }
    Ok(())
}

/// Creates a new entry and applies its amount to the owning account.
///
/// Fails with [`Error::AccountNotFound`] if the account is missing, [`Error::DuplicateTxid`] if
/// any entry in the store already uses `txid`, [`Error::NegativeBalance`] if the account cannot
/// absorb `amount`, and [`Error::AmountOutOfRange`] if the new balance would exceed the supported
/// magnitude. On failure no entry is written and the balance is unchanged.
#[instrument(skip(db))]
pub async fn create_entry(
    db: &DatabaseConnection,
    account_id: i64,
    txid: &str,
    amount: Amount,
) -> Result<ledger_entry::Model> {
    validate_txid(txid)?;

    let txn = db.begin().await?;

    balance::lock_account(&txn, account_id).await?;

    let existing = LedgerEntry::find()
        .filter(ledger_entry::Column::Txid.eq(txid))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateTxid {
            txid: txid.to_string(),
        });
    }

    balance::apply(&txn, account_id, &amount).await?;

    let now = chrono::Utc::now();
    let entry = ledger_entry::ActiveModel {
        account_id: Set(account_id),
        txid: Set(txid.to_string()),
        amount: Set(amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The unique index is the backstop for writers the explicit check cannot see.
    let result = entry.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateTxid {
            txid: txid.to_string(),
        },
        _ => Error::from(e),
    })?;

    txn.commit().await?;
    info!(entry_id = result.id, account_id, "Created ledger entry");
    Ok(result)
}

/// Replaces an entry's amount, applying the difference to the owning account.
///
/// The old amount is read after the account lock is held, so a concurrent amend or removal of
/// the same entry cannot interleave. Fails with [`Error::EntryNotFound`],
/// [`Error::NegativeBalance`] or [`Error::AmountOutOfRange`]; on failure the entry keeps its previous amount.
#[instrument(skip(db))]
pub async fn amend_entry(
    db: &DatabaseConnection,
    entry_id: i64,
    new_amount: Amount,
) -> Result<ledger_entry::Model> {
    let txn = db.begin().await?;

    balance::lock_entry_account(&txn, entry_id).await?;

    let entry = LedgerEntry::find_by_id(entry_id)
        .one(&txn)
        .await?
        .ok_or(Error::EntryNotFound { id: entry_id })?;

    let delta = new_amount.checked_sub(&entry.amount)?;
    balance::apply(&txn, entry.account_id, &delta).await?;

    let mut active: ledger_entry::ActiveModel = entry.into();
    active.amount = Set(new_amount);
    active.updated_at = Set(chrono::Utc::now());
    let result = active.update(&txn).await?;

    txn.commit().await?;
    info!(entry_id, %delta, "Amended ledger entry");
    Ok(result)
}

/// Deletes an entry, reversing its contribution to the owning account.
///
/// Removal is refused with [`Error::NegativeBalance`] when later entries already consumed the
/// funds this entry provided. Removing an id that no longer exists is [`Error::EntryNotFound`].
#[instrument(skip(db))]
pub async fn remove_entry(db: &DatabaseConnection, entry_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    balance::lock_entry_account(&txn, entry_id).await?;

    let entry = LedgerEntry::find_by_id(entry_id)
        .one(&txn)
        .await?
        .ok_or(Error::EntryNotFound { id: entry_id })?;

    balance::apply(&txn, entry.account_id, &-&entry.amount).await?;

    let deleted = LedgerEntry::delete_by_id(entry_id).exec(&txn).await?;
    if deleted.rows_affected == 0 {
        return Err(Error::EntryNotFound { id: entry_id });
    }

    txn.commit().await?;
    info!(entry_id, account_id = entry.account_id, "Removed ledger entry");
    Ok(())
}

/// Retrieves a specific entry by its unique ID.
pub async fn get_entry_by_id(
    db: &DatabaseConnection,
    entry_id: i64,
) -> Result<Option<ledger_entry::Model>> {
    LedgerEntry::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an entry by its external transaction id.
pub async fn get_entry_by_txid(
    db: &DatabaseConnection,
    txid: &str,
) -> Result<Option<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::Txid.eq(txid))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all entries of an account, newest first.
pub async fn get_entries_for_account(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::AccountId.eq(account_id))
        .order_by_desc(ledger_entry::Column::CreatedAt)
        .order_by_desc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
