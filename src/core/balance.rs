//! Balance mutator - the only writer of `accounts.balance`.
//!
//! Every entry write path runs inside one database transaction and calls into this module. The
//! first statement of each unit of work is a lock-acquiring no-op write on the owning account row:
//!
//! ```sql
//! UPDATE accounts SET balance = balance WHERE id = ?
//! ```
//!
//! On stores with row locks this holds an exclusive lock on that one account until commit, so
//! mutators of the same account serialize while other accounts proceed. On `SQLite` it takes the
//! database write lock before anything is read, which serializes writers without the
//! read-then-upgrade deadlock. Either way the balance read by [`apply`] is the latest committed
//! value and cannot change underneath the caller.

use crate::{
    core::money::Amount,
    entities::{Account, LedgerEntry, account, ledger_entry},
    errors::{Error, Result},
};
use sea_orm::sea_query::{Expr, Query, SimpleExpr};
use sea_orm::{Set, prelude::*};
use tracing::{debug, warn};

fn touch_balance() -> SimpleExpr {
    SimpleExpr::from(Expr::col(account::Column::Balance))
}

/// Acquires the exclusive lock on an account for the rest of the caller's transaction.
///
/// Returns [`Error::AccountNotFound`] when no such account exists.
pub async fn lock_account<C>(conn: &C, account_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Account::update_many()
        .col_expr(account::Column::Balance, touch_balance())
        .filter(account::Column::Id.eq(account_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::AccountNotFound { id: account_id });
    }
    Ok(())
}

/// Acquires the exclusive lock on the account that owns an entry.
///
/// Locking through a subquery keeps the lock as the first statement of the unit of work even
/// though the account id is not known yet. Returns [`Error::EntryNotFound`] when the entry does
/// not exist.
pub async fn lock_entry_account<C>(conn: &C, entry_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let owner = Query::select()
        .column(ledger_entry::Column::AccountId)
        .from(LedgerEntry)
        .and_where(ledger_entry::Column::Id.eq(entry_id))
        .to_owned();

    let result = Account::update_many()
        .col_expr(account::Column::Balance, touch_balance())
        .filter(account::Column::Id.in_subquery(owner))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::EntryNotFound { id: entry_id });
    }
    Ok(())
}

/// Applies a signed delta to an account's balance inside the caller's transaction.
///
/// The account is locked, its balance re-read, and `balance + delta` written back only when the
/// result is non-negative. On [`Error::NegativeBalance`] nothing has been written; the caller
/// must abandon its transaction so that any entry write is rolled back as well.
///
/// Returns the updated account.
pub async fn apply<C>(conn: &C, account_id: i64, delta: &Amount) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    lock_account(conn, account_id).await?;

    let account = Account::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let projected = account.balance.checked_add(delta)?;
    if projected.is_negative() {
        warn!(
            account_id,
            balance = %account.balance,
            %delta,
            "Rejected balance change below zero"
        );
        return Err(Error::NegativeBalance {
            account_id,
            balance: account.balance,
            delta: delta.clone(),
        });
    }

    debug!(account_id, balance = %account.balance, %delta, %projected, "Applying balance delta");

    let mut active: account::ActiveModel = account.into();
    active.balance = Set(projected);
    active.updated_at = Set(chrono::Utc::now());
    active.update(conn).await.map_err(Into::into)
}
