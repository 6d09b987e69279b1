//! Account business logic - creation, lookup, renaming, deletion and reconciliation.
//!
//! Accounts start with a zero balance. Nothing in this module writes the balance; it changes only
//! through [`crate::core::balance::apply`] as a side effect of entry mutations.

use crate::{
    core::{balance, money::Amount},
    entities::{Account, LedgerEntry, account, ledger_entry},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Longest accepted account label, in characters.
pub const MAX_LABEL_LEN: usize = 255;

fn validate_label(label: &str) -> Result<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidLabel {
            reason: "label cannot be empty".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(Error::InvalidLabel {
            reason: format!("label longer than {MAX_LABEL_LEN} characters"),
        });
    }
    Ok(trimmed.to_string())
}

/// Creates a new account with a zero balance.
///
/// The label is trimmed and must be non-empty.
#[instrument(skip(db))]
pub async fn create_account(db: &DatabaseConnection, label: &str) -> Result<account::Model> {
    let label = validate_label(label)?;

    let now = chrono::Utc::now();
    let account = account::ActiveModel {
        label: Set(label),
        balance: Set(Amount::zero()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = account.insert(db).await?;
    info!(account_id = result.id, "Created account");
    Ok(result)
}

/// Finds an account by its unique ID.
pub async fn get_account_by_id(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Option<account::Model>> {
    Account::find_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the materialized balance of an account.
///
/// This is a single-row read; it never re-sums entries.
pub async fn get_account_balance(db: &DatabaseConnection, account_id: i64) -> Result<Amount> {
    get_account_by_id(db, account_id)
        .await?
        .map(|account| account.balance)
        .ok_or(Error::AccountNotFound { id: account_id })
}

/// Lists all accounts ordered by id, then label.
pub async fn list_accounts(db: &DatabaseConnection) -> Result<Vec<account::Model>> {
    Account::find()
        .order_by_asc(account::Column::Id)
        .order_by_asc(account::Column::Label)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes an account's label. The balance is untouched.
#[instrument(skip(db))]
pub async fn rename_account(
    db: &DatabaseConnection,
    account_id: i64,
    label: &str,
) -> Result<account::Model> {
    let label = validate_label(label)?;

    let account = get_account_by_id(db, account_id)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let mut active: account::ActiveModel = account.into();
    active.label = Set(label);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes an account together with all of its ledger entries.
///
/// Runs as one unit of work under the account lock, so no concurrent entry mutation can slip in
/// between removing the entries and removing the account.
#[instrument(skip(db))]
pub async fn delete_account(db: &DatabaseConnection, account_id: i64) -> Result<u64> {
    let txn = db.begin().await?;

    balance::lock_account(&txn, account_id).await?;

    let removed = LedgerEntry::delete_many()
        .filter(ledger_entry::Column::AccountId.eq(account_id))
        .exec(&txn)
        .await?
        .rows_affected;

    Account::delete_by_id(account_id).exec(&txn).await?;

    txn.commit().await?;
    info!(account_id, removed_entries = removed, "Deleted account");
    Ok(removed)
}

/// Result of comparing an account's materialized balance with the sum of its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The account that was checked
    pub account_id: i64,
    /// Balance stored on the account row
    pub recorded: Amount,
    /// Exact sum of the account's entry amounts
    pub computed: Amount,
    /// Number of entries that were summed
    pub entry_count: usize,
}

impl Reconciliation {
    /// True when the stored balance equals the sum of entries.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.recorded == self.computed
    }
}

/// Recomputes an account's balance from its entries and compares it with the stored value.
///
/// Both reads happen in one transaction so they observe the same committed state.
pub async fn reconcile_account(db: &DatabaseConnection, account_id: i64) -> Result<Reconciliation> {
    let txn = db.begin().await?;

    let account = Account::find_by_id(account_id)
        .one(&txn)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let entries = LedgerEntry::find()
        .filter(ledger_entry::Column::AccountId.eq(account_id))
        .all(&txn)
        .await?;

    txn.commit().await?;

    let entry_count = entries.len();
    let computed = Amount::sum(entries.into_iter().map(|entry| entry.amount))?;

    Ok(Reconciliation {
        account_id,
        recorded: account.balance,
        computed,
        entry_count,
    })
}
