use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "rcv")]
#[command(about = "Receiving reconciliation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> device...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Open a waybill and print its buckets as JSON
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Also load the articles of this PO (repeatable)
        #[arg(long = "po")]
        po_nbrs: Vec<String>,
    },

    /// Submit every open unit of a collection and print the outcomes
    Replay {
        #[command(flatten)]
        source: SourceArgs,

        /// Replay the articles of this PO instead of the primary collection
        #[arg(long)]
        po: Option<String>,

        /// Also resubmit units already in NeedsSecondaryReview
        #[arg(long, default_value_t = false)]
        include_secondary: bool,
    },

    /// Record the driver's arrival for an in-transit waybill
    CheckIn {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        arrival: commands::check_in::ArrivalArgs,
    },
}

fn init_tracing() {
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Local dev convenience; absent file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = rcv_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Show { source, po_nbrs } => {
            commands::show::run(&source, &po_nbrs).await?;
        }

        Commands::Replay {
            source,
            po,
            include_secondary,
        } => {
            commands::replay::run(&source, po.as_deref(), include_secondary).await?;
        }

        Commands::CheckIn { source, arrival } => {
            commands::check_in::run(&source, &arrival).await?;
        }
    }

    Ok(())
}
