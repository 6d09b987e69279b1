use crate::{
    core::{account, retry::RetryPolicy},
    entities::account::Model,
    errors::Result,
};
use clap::Subcommand;
use sea_orm::DatabaseConnection;
use tracing::instrument;

/// Account commands.
#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Create an account with a zero balance
    Create {
        /// Human-readable label
        label: String,
    },
    /// List all accounts
    List,
    /// Print the current balance of an account
    Balance {
        /// Account id
        id: i64,
    },
    /// Change an account's label
    Rename {
        /// Account id
        id: i64,
        /// New label
        label: String,
    },
    /// Delete an account and all of its entries
    Delete {
        /// Account id
        id: i64,
    },
    /// Compare the stored balance with the sum of the account's entries
    Reconcile {
        /// Account id
        id: i64,
    },
}

fn render_account(account: &Model) -> String {
    format!("#{} {}: {}", account.id, account.label, account.balance)
}

#[instrument(skip(db, policy))]
pub(super) async fn handle(
    db: &DatabaseConnection,
    policy: RetryPolicy,
    command: AccountCommand,
) -> Result<String> {
    match command {
        AccountCommand::Create { label } => {
            let created = policy
                .run("create_account", || account::create_account(db, &label))
                .await?;
            Ok(format!("Created {}", render_account(&created)))
        }
        AccountCommand::List => {
            let accounts = account::list_accounts(db).await?;
            if accounts.is_empty() {
                return Ok("No accounts.".to_string());
            }
            Ok(accounts
                .iter()
                .map(render_account)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        AccountCommand::Balance { id } => {
            let balance = account::get_account_balance(db, id).await?;
            Ok(balance.to_string())
        }
        AccountCommand::Rename { id, label } => {
            let renamed = policy
                .run("rename_account", || account::rename_account(db, id, &label))
                .await?;
            Ok(format!("Renamed {}", render_account(&renamed)))
        }
        AccountCommand::Delete { id } => {
            let removed = policy
                .run("delete_account", || account::delete_account(db, id))
                .await?;
            Ok(format!("Deleted account #{id} and {removed} entries"))
        }
        AccountCommand::Reconcile { id } => {
            let report = policy
                .run("reconcile_account", || account::reconcile_account(db, id))
                .await?;
            let status = if report.is_consistent() { "OK" } else { "MISMATCH" };
            Ok(format!(
                "Account #{}: {status}\n  recorded: {}\n  computed: {} ({} entries)",
                report.account_id, report.recorded, report.computed, report.entry_count
            ))
        }
    }
}
