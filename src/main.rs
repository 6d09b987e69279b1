use balance_ledger::{cli, config};
use balance_ledger::errors::Result;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible); logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file; env vars can be set externally
    dotenv().ok();

    let args = cli::Cli::parse();

    // 3. Resolve settings (explicit --config, ./ledger.toml, defaults; DATABASE_URL overrides)
    let settings = config::settings::resolve_settings(args.config.as_deref())
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Open the database and make sure the schema exists
    let db = config::database::init_db(&settings.database)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Run the command
    let output = cli::run(&db, settings.retry_policy(), args.command)
        .await
        .inspect_err(|e| error!(kind = ?e.kind(), "Command failed: {}", e))?;

    println!("{output}");
    Ok(())
}
