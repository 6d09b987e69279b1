//! Entry listing with filtering and sorting.
//!
//! This is a pure read: it pulls entries from the store and never recomputes balances. Amount
//! bounds and amount ordering are evaluated in Rust because the stored text form of an amount is
//! not numerically ordered.

use crate::{
    core::money::Amount,
    entities::{LedgerEntry, ledger_entry},
    errors::Result,
};
use sea_orm::prelude::*;
use std::cmp::Ordering;

/// Criteria an entry must satisfy to be listed. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries of this account
    pub account_id: Option<i64>,
    /// Case-insensitive substring of the txid
    pub txid_contains: Option<String>,
    /// Inclusive lower bound on the amount
    pub amount_min: Option<Amount>,
    /// Inclusive upper bound on the amount
    pub amount_max: Option<Amount>,
}

impl EntryFilter {
    /// Entries belonging to one account.
    #[must_use]
    pub fn for_account(account_id: i64) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    fn matches(&self, entry: &ledger_entry::Model) -> bool {
        if let Some(needle) = &self.txid_contains {
            if !entry
                .txid
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.amount_min.as_ref().is_some_and(|min| &entry.amount < min) {
            return false;
        }
        if self.amount_max.as_ref().is_some_and(|max| &entry.amount > max) {
            return false;
        }
        true
    }
}

/// Field to order listed entries by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// Creation timestamp
    #[default]
    CreatedAt,
    /// Signed amount
    Amount,
    /// External transaction id
    Txid,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    Asc,
    /// Largest first
    #[default]
    Desc,
}

/// Ordering for listed entries. Defaults to newest first; ties fall back to the entry id in the
/// same direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntrySort {
    /// Primary sort key
    pub field: SortField,
    /// Direction applied to the key and the id tie-break
    pub direction: SortDirection,
}

impl EntrySort {
    fn compare(self, a: &ledger_entry::Model, b: &ledger_entry::Model) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Amount => a.amount.cmp(&b.amount),
            SortField::Txid => a.txid.cmp(&b.txid),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Lists entries matching `filter`, ordered by `sort`.
pub async fn list_entries(
    db: &DatabaseConnection,
    filter: &EntryFilter,
    sort: EntrySort,
) -> Result<Vec<ledger_entry::Model>> {
    let mut query = LedgerEntry::find();
    if let Some(account_id) = filter.account_id {
        query = query.filter(ledger_entry::Column::AccountId.eq(account_id));
    }

    let mut entries: Vec<ledger_entry::Model> = query
        .all(db)
        .await?
        .into_iter()
        .filter(|entry| filter.matches(entry))
        .collect();

    entries.sort_by(|a, b| sort.compare(a, b));
    Ok(entries)
}
