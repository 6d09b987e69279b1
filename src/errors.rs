//! Unified error types and result handling.
//!
//! Every failure inside the ledger core is raised as an [`Error`] at the point where it is
//! detected. Callers use [`Error::kind`] to map errors onto protocol responses and
//! [`Error::is_retryable`] to decide whether an operation may be attempted again.

use crate::core::money::Amount;
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// Coarse classification of [`Error`] values for the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A uniqueness rule was violated (duplicate `txid`).
    Conflict,
    /// The mutation would have left an account balance below zero.
    NegativeBalance,
    /// A referenced account or entry does not exist.
    NotFound,
    /// The unit of work could not be serialized against a concurrent mutator.
    TransactionConflict,
    /// The caller supplied malformed input.
    InvalidInput,
    /// Configuration, I/O or unexpected storage failure.
    Internal,
}

/// Every failure the ledger can report.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings file or environment could not be turned into settings.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// A storage failure that is not a transient lock conflict.
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Reading a settings file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An amount could not be parsed or lies outside the supported precision or magnitude.
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount {
        /// The rejected input
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A computed balance or difference would leave the supported magnitude.
    #[error("Amount out of range: {reason}")]
    AmountOutOfRange {
        /// The expression that overflowed
        reason: String,
    },

    /// An account label is empty or too long.
    #[error("Invalid label: {reason}")]
    InvalidLabel {
        /// Why the label was rejected
        reason: String,
    },

    /// A transaction id is empty or too long.
    #[error("Invalid transaction id: {reason}")]
    InvalidTxid {
        /// Why the txid was rejected
        reason: String,
    },

    /// No account has this id.
    #[error("Account not found: {id}")]
    AccountNotFound {
        /// Requested account id
        id: i64,
    },

    /// No entry has this id.
    #[error("Ledger entry not found: {id}")]
    EntryNotFound {
        /// Requested entry id
        id: i64,
    },

    /// No entry carries this transaction id.
    #[error("No ledger entry with transaction id: {txid}")]
    TxidNotFound {
        /// Requested transaction id
        txid: String,
    },

    /// Another entry already uses this transaction id.
    #[error("Transaction id already exists: {txid}")]
    DuplicateTxid {
        /// The conflicting transaction id
        txid: String,
    },

    /// Applying the mutation would drive the account balance below zero.
    #[error(
        "Account {account_id} balance cannot become negative: balance {balance}, change {delta}"
    )]
    NegativeBalance {
        /// Account whose balance would go negative
        account_id: i64,
        /// Balance before the mutation
        balance: Amount,
        /// Change the mutation tried to apply
        delta: Amount,
    },

    /// The unit of work lost a race with a concurrent writer or timed out; it may be retried.
    #[error("Concurrent update conflict: {reason}")]
    TransactionConflict {
        /// Driver message or timeout description
        reason: String,
    },
}

impl Error {
    /// Returns the coarse classification used by callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTxid { .. } => ErrorKind::Conflict,
            Self::NegativeBalance { .. } => ErrorKind::NegativeBalance,
            Self::AccountNotFound { .. }
            | Self::EntryNotFound { .. }
            | Self::TxidNotFound { .. } => ErrorKind::NotFound,
            Self::TransactionConflict { .. } => ErrorKind::TransactionConflict,
            Self::InvalidAmount { .. }
            | Self::AmountOutOfRange { .. }
            | Self::InvalidLabel { .. }
            | Self::InvalidTxid { .. } => ErrorKind::InvalidInput,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Only transient concurrency failures may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::TransactionConflict)
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match transient_reason(&err) {
            Some(reason) => Self::TransactionConflict { reason },
            None => Self::Database(err),
        }
    }
}

/// SQLite reports lock contention as `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6), possibly as an
/// extended code whose low byte carries the primary code. Postgres uses SQLSTATE `40001`
/// (serialization failure) and `40P01` (deadlock detected).
fn transient_reason(err: &DbErr) -> Option<String> {
    match err {
        DbErr::ConnectionAcquire(acquire) => Some(acquire.to_string()),
        DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx_err)) => {
            let db_err = sqlx_err.as_database_error()?;
            let code = db_err.code()?;
            let transient = match code.parse::<i64>() {
                Ok(numeric) => matches!(numeric & 0xff, 5 | 6),
                Err(_) => matches!(code.as_ref(), "40001" | "40P01"),
            };
            transient.then(|| db_err.message().to_string())
        }
        _ => None,
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
