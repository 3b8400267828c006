use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use payout_engine::application::orchestrator::PayoutOrchestrator;
use payout_engine::application::queries::PayoutQueries;
use payout_engine::application::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use payout_engine::domain::event::LiquidationEvent;
use payout_engine::domain::payout::PayoutStatus;
use payout_engine::domain::ports::{PayoutFilter, PayoutStoreRef};
use payout_engine::infrastructure::in_memory::InMemoryPayoutStore;
#[cfg(feature = "storage-rocksdb")]
use payout_engine::infrastructure::rocksdb::RocksDBStore;
use payout_engine::infrastructure::simulated_provider::SimulatedProvider;
use payout_engine::interfaces::csv::payout_writer::PayoutWriter;
use payout_engine::interfaces::csv::recipient_reader::RecipientReader;
use payout_engine::logging::init_logging;
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYOUT_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "PAYOUT_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one payout run for an event and print its payouts as CSV
    Run(RunArgs),
    /// List all runs as JSON
    Runs,
    /// List payouts as CSV
    Payouts {
        #[arg(long, required_unless_present = "run_id")]
        event_id: Option<String>,
        #[arg(long)]
        run_id: Option<Uuid>,
        #[arg(long)]
        status: Option<PayoutStatus>,
    },
    /// Print a payout and its audit trail as JSON
    Trace { payout_id: Uuid },
}

#[derive(Args)]
struct RunArgs {
    /// Recipients CSV to load before the run
    #[arg(long)]
    recipients: Option<PathBuf>,

    #[arg(long)]
    event_id: String,

    /// Creates or replaces the event with this total before running
    #[arg(long)]
    total_amount: Option<Decimal>,

    #[arg(long, requires = "total_amount")]
    payout_date: Option<NaiveDate>,

    #[arg(long, requires = "total_amount")]
    event_name: Option<String>,

    #[arg(long, env = "PAYOUT_MOCK_FAILURE_RATE", default_value_t = 0.05)]
    failure_rate: f64,

    #[arg(long, env = "PAYOUT_MOCK_LATENCY_MS", default_value_t = 100)]
    latency_ms: u64,

    /// Seed for a reproducible simulated provider
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if cli.db_path.is_none() && !matches!(cli.command, Command::Run(_)) {
        eprintln!("NOTE: No --db-path given. Querying a fresh In-Memory store, which is always empty.");
    }
    let store = open_store(cli.db_path)?;

    match cli.command {
        Command::Run(args) => run(store, args).await,
        Command::Runs => {
            let runs = PayoutQueries::new(store).runs().await.into_diagnostic()?;
            serde_json::to_writer_pretty(io::stdout().lock(), &runs).into_diagnostic()?;
            println!();
            Ok(())
        }
        Command::Payouts {
            event_id,
            run_id,
            status,
        } => {
            let filter = PayoutFilter {
                event_id,
                run_id,
                status,
                ..PayoutFilter::default()
            };
            let payouts = PayoutQueries::new(store)
                .payouts(&filter)
                .await
                .into_diagnostic()?;
            PayoutWriter::new(io::stdout().lock())
                .write_payouts(&payouts)
                .into_diagnostic()?;
            Ok(())
        }
        Command::Trace { payout_id } => {
            let trace = PayoutQueries::new(store)
                .trace(payout_id)
                .await
                .into_diagnostic()?
                .ok_or_else(|| miette!("Payout not found: {payout_id}"))?;
            serde_json::to_writer_pretty(io::stdout().lock(), &trace).into_diagnostic()?;
            println!();
            Ok(())
        }
    }
}

fn open_store(db_path: Option<PathBuf>) -> Result<PayoutStoreRef> {
    #[cfg(feature = "storage-rocksdb")]
    {
        if let Some(path) = db_path {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            return Ok(Arc::new(store));
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        if db_path.is_some() {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(Arc::new(InMemoryPayoutStore::new()))
}

async fn run(store: PayoutStoreRef, args: RunArgs) -> Result<()> {
    if let Some(path) = &args.recipients {
        let file = File::open(path).into_diagnostic()?;
        for recipient in RecipientReader::new(file).recipients() {
            match recipient {
                Ok(recipient) => store.save_recipient(recipient).await.into_diagnostic()?,
                Err(e) => tracing::warn!(error = %e, "skipping unreadable recipient row"),
            }
        }
    }

    if let Some(total) = args.total_amount {
        let name = args
            .event_name
            .clone()
            .unwrap_or_else(|| args.event_id.clone());
        let mut event = LiquidationEvent::new(&args.event_id, name, total);
        if let Some(date) = args.payout_date {
            event = event.with_payout_date(date);
        }
        store.save_event(event).await.into_diagnostic()?;
    }

    let mut provider = SimulatedProvider::new(
        args.failure_rate,
        Duration::from_millis(args.latency_ms),
    );
    if let Some(seed) = args.seed {
        provider = provider.with_seed(seed);
    }

    let orchestrator = PayoutOrchestrator::new(store.clone(), Arc::new(provider))
        .with_retry_policy(RetryPolicy::default().with_max_attempts(args.max_attempts));
    let run = orchestrator
        .execute_run(&args.event_id)
        .await
        .into_diagnostic()?;

    eprintln!(
        "run {} {:?}: created={} skipped={} failed={}",
        run.id, run.status, run.created_count, run.skipped_count, run.failed_count
    );

    let payouts = PayoutQueries::new(store)
        .payouts(&PayoutFilter::for_event(&args.event_id))
        .await
        .into_diagnostic()?;
    PayoutWriter::new(io::stdout().lock())
        .write_payouts(&payouts)
        .into_diagnostic()?;
    Ok(())
}
