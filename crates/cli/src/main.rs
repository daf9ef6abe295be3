//! Lendrisk CLI - Main entry point

use clap::{Parser, Subcommand, ValueEnum};
use lendrisk_cli::commands::{self, LoopArgs};
use lendrisk_cli::{AppContext, ConfigLoader};
use lendrisk_core::{BankAddress, Fixed};
use lendrisk_risk::RequirementType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lendrisk")]
#[command(about = "Lendrisk - lending protocol risk engine", long_about = None)]
struct Cli {
    /// Config file path (defaults to ./lendrisk.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot with banks, accounts, prices and swap rates
    #[arg(short, long, default_value = "snapshot.json")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Requirement {
    Initial,
    Maintenance,
    Equity,
}

impl From<Requirement> for RequirementType {
    fn from(value: Requirement) -> Self {
        match value {
            Requirement::Initial => RequirementType::Initial,
            Requirement::Maintenance => RequirementType::Maintenance,
            Requirement::Equity => RequirementType::Equity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show account health
    Health {
        #[arg(long)]
        account: String,
        #[arg(long, value_enum, default_value = "maintenance")]
        requirement: Requirement,
    },

    /// Price of a bank's asset at which the account becomes liquidatable
    LiquidationPrice {
        #[arg(long)]
        account: String,
        #[arg(long)]
        bank: String,
    },

    /// Max borrow and max withdraw for an account in one bank
    Limits {
        #[arg(long)]
        account: String,
        #[arg(long)]
        bank: String,
    },

    /// Show utilization, interest rates and capacity of a bank
    Rates {
        #[arg(long)]
        bank: String,
    },

    /// Plan a leveraged deposit/borrow/swap loop (dry run)
    Loop {
        #[arg(long)]
        account: String,
        /// Bank the principal and swapped proceeds go into
        #[arg(long)]
        deposit_bank: String,
        /// Bank that is borrowed from
        #[arg(long)]
        borrow_bank: String,
        /// Principal in UI units of the deposit asset
        #[arg(long)]
        principal: Fixed,
        /// Target leverage, e.g. 3
        #[arg(long)]
        leverage: Fixed,
        /// Overrides `[looping] max_slippage_bps`
        #[arg(long)]
        slippage_bps: Option<u32>,
        /// Overrides `[looping] max_iterations`
        #[arg(long)]
        max_iterations: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::load_optional(cli.config.as_deref())?;
    init_logging(&loader.get().log_level);
    if let Some(path) = loader.path() {
        tracing::debug!(config = %path.display(), "Loaded config");
    }

    let ctx = AppContext::load(loader.into_config(), &cli.snapshot)?;

    let output = match cli.command {
        Commands::Health { account, requirement } => {
            commands::health(&ctx, &account, requirement.into()).await?
        }
        Commands::LiquidationPrice { account, bank } => {
            commands::liquidation_price(&ctx, &account, &BankAddress::new(bank)).await?
        }
        Commands::Limits { account, bank } => {
            commands::limits(&ctx, &account, &BankAddress::new(bank)).await?
        }
        Commands::Rates { bank } => commands::rates(&ctx, &BankAddress::new(bank)).await?,
        Commands::Loop {
            account,
            deposit_bank,
            borrow_bank,
            principal,
            leverage,
            slippage_bps,
            max_iterations,
        } => {
            let args = LoopArgs {
                account,
                deposit_bank: BankAddress::new(deposit_bank),
                borrow_bank: BankAddress::new(borrow_bank),
                principal,
                leverage,
                slippage_bps,
                max_iterations,
            };
            commands::loop_plan(&ctx, args).await?
        }
    };

    print!("{output}");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
