use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ledgerfx::cli::ui;
use ledgerfx::core::log::init_logging;
use ledgerfx::core::{CurrencyCode, Money};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ledgerfx::AppCommand {
    fn from(cmd: Commands) -> ledgerfx::AppCommand {
        match cmd {
            Commands::Total { currency } => ledgerfx::AppCommand::Total {
                currency: currency.map(CurrencyCode::from),
            },
            Commands::Accounts => ledgerfx::AppCommand::Accounts,
            Commands::Convert { amount, from, to } => ledgerfx::AppCommand::Convert {
                money: Money::new(amount, from),
                to: to.into(),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the total balance of all accounts
    Total {
        /// Report in this currency instead of the configured one
        #[arg(long)]
        currency: Option<String>,
    },
    /// List configured accounts
    Accounts,
    /// Convert an amount between two currencies
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => ledgerfx::cli::setup::setup(),
        Some(cmd) => ledgerfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = ?e, "Application failed");
        eprintln!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
        std::process::exit(1);
    }
    Ok(())
}
