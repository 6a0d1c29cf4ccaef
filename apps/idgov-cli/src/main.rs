//! idgov - Command-line host for the REST directory connector
//!
//! Runs one platform operation per invocation against the configured
//! directory. Records are written to stdout as JSON, one per line; logs go
//! to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;

use idgov_connector::model::AccountCreateAttributes;
use idgov_connector::traits::{AccountOp, Connector, EnableOp, EntitlementOp};
use idgov_connector_rest::DirectoryConnector;

mod error;
mod input;
mod logging;

use error::CliResult;

/// idgov - Identity-governance directory connector
#[derive(Parser, Debug)]
#[command(name = "idgov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Connector configuration file (JSON). Environment variables are used when omitted.
    #[arg(long, global = true, env = "IDGOV_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the directory is reachable with the configured credentials
    TestConnection,

    /// Stream every account
    ListAccounts,

    /// Read one account
    ReadAccount {
        /// Account identity
        identity: String,
    },

    /// Create an account, or adopt the one with the same email
    CreateAccount {
        /// JSON attributes file ("-" or omitted reads stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Apply attribute changes to an account
    UpdateAccount {
        /// Account identity
        identity: String,

        /// JSON file with one change or a list of changes ("-" or omitted reads stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Enable an account
    EnableAccount {
        /// Account identity
        identity: String,
    },

    /// Disable an account
    DisableAccount {
        /// Account identity
        identity: String,
    },

    /// Stream every entitlement
    ListEntitlements,

    /// Read one entitlement
    ReadEntitlement {
        /// Entitlement identity
        identity: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_logging(logging::DEFAULT_FILTER, cli.log_json);

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(code = e.exit_code(), error = %e, "Operation failed");
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = input::load_config(cli.config.as_deref()).await?;
    let connector = DirectoryConnector::new(config)?;
    tracing::debug!(connector = ?connector, "Connector ready");

    match cli.command {
        Commands::TestConnection => {
            connector.test_connection().await?;
            emit(&serde_json::json!({ "status": "ok", "connector": connector.display_name() }))
        }
        Commands::ListAccounts => {
            let mut accounts = connector.list_accounts();
            while let Some(account) = accounts.next().await {
                emit(&account?)?;
            }
            Ok(())
        }
        Commands::ReadAccount { identity } => emit(&connector.read_account(&identity).await?),
        Commands::CreateAccount { input: path } => {
            let raw = input::read_input(path.as_deref()).await?;
            let attributes: AccountCreateAttributes = input::parse_json(&raw)?;
            emit(&connector.create_account(attributes).await?)
        }
        Commands::UpdateAccount { identity, input: path } => {
            let raw = input::read_input(path.as_deref()).await?;
            let changes = input::parse_changes(&raw)?;
            emit(&connector.update_account(&identity, changes).await?)
        }
        Commands::EnableAccount { identity } => emit(&connector.enable_account(&identity).await?),
        Commands::DisableAccount { identity } => {
            emit(&connector.disable_account(&identity).await?)
        }
        Commands::ListEntitlements => {
            let mut groups = connector.list_entitlements();
            while let Some(group) = groups.next().await {
                emit(&group?)?;
            }
            Ok(())
        }
        Commands::ReadEntitlement { identity } => {
            emit(&connector.read_entitlement(&identity).await?)
        }
    }
}

/// Write one record as a JSON line on stdout.
fn emit<T: Serialize>(record: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_account() {
        let cli = Cli::try_parse_from(["idgov", "read-account", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::ReadAccount { ref identity } if identity == "1"));
        assert!(!cli.log_json);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "idgov",
            "list-entitlements",
            "--config",
            "connector.json",
            "--log-json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::ListEntitlements));
        assert_eq!(cli.config, Some(PathBuf::from("connector.json")));
        assert!(cli.log_json);
    }

    #[test]
    fn test_parse_update_account_input() {
        let cli =
            Cli::try_parse_from(["idgov", "update-account", "7", "--input", "changes.json"])
                .unwrap();
        match cli.command {
            Commands::UpdateAccount { identity, input } => {
                assert_eq!(identity, "7");
                assert_eq!(input, Some(PathBuf::from("changes.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_read_account_requires_identity() {
        assert!(Cli::try_parse_from(["idgov", "read-account"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["idgov", "delete-account", "1"]).is_err());
    }
}
