use crate::{
    core::{
        entry,
        listing::{self, EntryFilter, EntrySort, SortDirection, SortField},
        money::Amount,
        retry::RetryPolicy,
    },
    entities::ledger_entry::Model,
    errors::{Error, Result},
};
use clap::{Args, Subcommand, ValueEnum};
use sea_orm::DatabaseConnection;
use tracing::instrument;

/// Entry commands.
#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    /// Record an entry and apply it to the account balance
    Create {
        /// Account id
        account: i64,
        /// External transaction id, unique across the ledger
        txid: String,
        /// Signed decimal amount (negative for debits)
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
    /// Replace the amount of an existing entry
    Amend {
        /// Entry id
        id: i64,
        /// New signed decimal amount
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
    /// Delete an entry and reverse its effect on the balance
    Remove {
        /// Entry id
        id: i64,
    },
    /// Show one entry, looked up by id or txid
    Show(ShowArgs),
    /// List entries with optional filters
    List(ListArgs),
}

/// Lookup key for `entry show`.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ShowArgs {
    /// Entry id
    #[arg(long)]
    pub id: Option<i64>,
    /// External transaction id
    #[arg(long)]
    pub txid: Option<String>,
}

/// Filters and ordering for `entry list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only entries of this account
    #[arg(long)]
    pub account: Option<i64>,
    /// Case-insensitive txid substring
    #[arg(long)]
    pub txid: Option<String>,
    /// Inclusive lower amount bound
    #[arg(long, allow_negative_numbers = true)]
    pub amount_min: Option<Amount>,
    /// Inclusive upper amount bound
    #[arg(long, allow_negative_numbers = true)]
    pub amount_max: Option<Amount>,
    /// Sort key
    #[arg(long, value_enum, default_value_t = SortKey::CreatedAt)]
    pub sort: SortKey,
    /// Sort direction
    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    pub order: SortOrder,
}

/// Sort keys accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Creation time
    CreatedAt,
    /// Amount
    Amount,
    /// Transaction id
    Txid,
}

/// Sort directions accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl From<SortKey> for SortField {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::CreatedAt => Self::CreatedAt,
            SortKey::Amount => Self::Amount,
            SortKey::Txid => Self::Txid,
        }
    }
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

impl ListArgs {
    fn filter(&self) -> EntryFilter {
        EntryFilter {
            account_id: self.account,
            txid_contains: self.txid.clone(),
            amount_min: self.amount_min.clone(),
            amount_max: self.amount_max.clone(),
        }
    }

    fn sort(&self) -> EntrySort {
        EntrySort {
            field: self.sort.into(),
            direction: self.order.into(),
        }
    }
}

fn render_entry(entry: &Model) -> String {
    format!(
        "#{} account {} {}: {} ({})",
        entry.id,
        entry.account_id,
        entry.txid,
        entry.amount,
        entry.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// The entry a timed-out `create` left behind, if it matches the request.
async fn committed_create(
    db: &DatabaseConnection,
    account_id: i64,
    txid: &str,
    amount: &Amount,
) -> Result<Option<Model>> {
    Ok(entry::get_entry_by_txid(db, txid)
        .await?
        .filter(|found| found.account_id == account_id && &found.amount == amount))
}

/// `Some` when a timed-out `remove` already deleted the entry.
async fn committed_remove(db: &DatabaseConnection, id: i64) -> Result<Option<()>> {
    Ok(entry::get_entry_by_id(db, id).await?.is_none().then_some(()))
}

#[instrument(skip(db, policy))]
pub(super) async fn handle(
    db: &DatabaseConnection,
    policy: RetryPolicy,
    command: EntryCommand,
) -> Result<String> {
    match command {
        EntryCommand::Create {
            account,
            txid,
            amount,
        } => {
            let created = policy
                .run_with_recovery(
                    "create_entry",
                    || entry::create_entry(db, account, &txid, amount.clone()),
                    || committed_create(db, account, &txid, &amount),
                )
                .await?;
            Ok(format!("Created {}", render_entry(&created)))
        }
        EntryCommand::Amend { id, amount } => {
            let amended = policy
                .run("amend_entry", || entry::amend_entry(db, id, amount.clone()))
                .await?;
            Ok(format!("Amended {}", render_entry(&amended)))
        }
        EntryCommand::Remove { id } => {
            policy
                .run_with_recovery(
                    "remove_entry",
                    || entry::remove_entry(db, id),
                    || committed_remove(db, id),
                )
                .await?;
            Ok(format!("Removed entry #{id}"))
        }
        EntryCommand::Show(args) => {
            let found = match args.id {
                Some(id) => entry::get_entry_by_id(db, id)
                    .await?
                    .ok_or(Error::EntryNotFound { id })?,
                None => {
                    let txid = args.txid.unwrap_or_default();
                    entry::get_entry_by_txid(db, &txid)
                        .await?
                        .ok_or(Error::TxidNotFound { txid })?
                }
            };
            Ok(render_entry(&found))
        }
        EntryCommand::List(args) => {
            let entries = listing::list_entries(db, &args.filter(), args.sort()).await?;
            if entries.is_empty() {
                return Ok("No entries.".to_string());
            }
            Ok(entries
                .iter()
                .map(render_entry)
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::test_utils::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> EntryCommand {
        let mut argv = vec!["balance-ledger", "entry"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Entry(command) => command,
            Command::Account(_) => unreachable!("parsed an entry command"),
        }
    }

    #[test]
    fn test_parse_negative_amount() {
        let command = parse(&["create", "7", "tx-neg", "-12.25"]);
        match command {
            EntryCommand::Create {
                account,
                txid,
                amount: value,
            } => {
                assert_eq!(account, 7);
                assert_eq!(txid, "tx-neg");
                assert_eq!(value, amount("-12.25"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_amount() {
        let argv = ["balance-ledger", "entry", "create", "1", "tx", "12.3.4"];
        assert!(Cli::try_parse_from(argv).is_err());

        let too_precise = format!("0.{}1", "0".repeat(18));
        let argv = ["balance-ledger", "entry", "create", "1", "tx", too_precise.as_str()];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_parse_list_options() {
        let command = parse(&[
            "list",
            "--account",
            "3",
            "--amount-min",
            "-5",
            "--sort",
            "amount",
            "--order",
            "asc",
        ]);
        let EntryCommand::List(args) = command else {
            panic!("expected list");
        };
        let filter = args.filter();
        assert_eq!(filter.account_id, Some(3));
        assert_eq!(filter.amount_min, Some(amount("-5")));
        assert_eq!(filter.amount_max, None);
        assert_eq!(
            args.sort(),
            EntrySort {
                field: SortField::Amount,
                direction: SortDirection::Asc,
            }
        );

        let EntryCommand::List(defaults) = parse(&["list"]) else {
            panic!("expected list");
        };
        assert_eq!(defaults.sort(), EntrySort::default());
    }

    #[test]
    fn test_show_requires_exactly_one_key() {
        assert!(Cli::try_parse_from(["balance-ledger", "entry", "show"]).is_err());
        assert!(
            Cli::try_parse_from(["balance-ledger", "entry", "show", "--id", "1", "--txid", "a"])
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_amend_remove_and_show() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        let policy = RetryPolicy::default();
        let created = create_test_entry(&db, account.id, "tx-show", "10").await?;

        let output = handle(&db, policy, parse(&["show", "--txid", "tx-show"])).await?;
        assert!(output.contains("tx-show: 10"), "{output}");

        let id = created.id.to_string();
        let output = handle(&db, policy, parse(&["amend", &id, "4.5"])).await?;
        assert!(output.starts_with("Amended"), "{output}");
        assert!(output.contains("tx-show: 4.5"), "{output}");

        let output = handle(&db, policy, parse(&["remove", &id])).await?;
        assert_eq!(output, format!("Removed entry #{id}"));

        let result = handle(&db, policy, parse(&["show", "--id", &id])).await;
        assert!(matches!(result, Err(Error::EntryNotFound { .. })));

        let result = handle(&db, policy, parse(&["show", "--txid", "tx-show"])).await;
        assert!(matches!(result, Err(Error::TxidNotFound { .. })));

        let output = handle(&db, policy, parse(&["list"])).await?;
        assert_eq!(output, "No entries.");

        Ok(())
    }

    #[tokio::test]
    async fn test_committed_create_matches_only_the_same_request() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        let other = create_test_account(&db, "Other").await?;
        let created = create_test_entry(&db, account.id, "tx-once", "25").await?;

        let found = committed_create(&db, account.id, "tx-once", &amount("25.00")).await?;
        assert_eq!(found, Some(created));

        assert!(committed_create(&db, account.id, "tx-once", &amount("26")).await?.is_none());
        assert!(committed_create(&db, other.id, "tx-once", &amount("25")).await?.is_none());
        assert!(committed_create(&db, account.id, "tx-never", &amount("25")).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_committed_remove_reports_missing_entry() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        let created = create_test_entry(&db, account.id, "tx-gone", "5").await?;

        assert_eq!(committed_remove(&db, created.id).await?, None);

        entry::remove_entry(&db, created.id).await?;
        assert_eq!(committed_remove(&db, created.id).await?, Some(()));

        Ok(())
    }
}
