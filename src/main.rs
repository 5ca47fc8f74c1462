use chrono::Local;
use clap::{Parser, ValueEnum};
use emi_payments::application::policy::OverpaymentPolicy;
use emi_payments::application::service::PaymentService;
use emi_payments::domain::ports::{PaymentStoreBox, ReceivableStoreBox};
use emi_payments::infrastructure::in_memory::InMemoryLoanStore;
use emi_payments::interfaces::console::Console;
use emi_payments::interfaces::csv::receivable_reader::ReceivableReader;
use log::{LevelFilter, info, warn};
use miette::{IntoDiagnostic, Result};
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Overpayment {
    /// Accept payments above penalty + EMI and leave the excess unallocated
    Absorb,
    /// Refuse payments above penalty + EMI
    Reject,
}

impl From<Overpayment> for OverpaymentPolicy {
    fn from(value: Overpayment) -> Self {
        match value {
            Overpayment::Absorb => OverpaymentPolicy::Absorb,
            Overpayment::Reject => OverpaymentPolicy::Reject,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Receivables CSV file to load before the menu starts
    #[arg(long)]
    receivables: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// How to treat payments above penalty + EMI
    #[arg(long, value_enum, default_value_t = Overpayment::Absorb)]
    overpayment: Overpayment,

    /// Log level for diagnostics written to stderr
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

fn in_memory_stores() -> (ReceivableStoreBox, PaymentStoreBox) {
    let store = InMemoryLoanStore::new();
    (Box::new(store.clone()), Box::new(store))
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(ReceivableStoreBox, PaymentStoreBox)> {
    use emi_payments::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(&path).into_diagnostic()?;
            info!("Using RocksDB storage at {}", path.display());
            Ok((Box::new(store.clone()), Box::new(store)))
        }
        None => Ok(in_memory_stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(ReceivableStoreBox, PaymentStoreBox)> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

async fn load_receivables(service: &PaymentService, path: PathBuf) -> Result<()> {
    let file = File::open(&path).into_diagnostic()?;
    let reader = ReceivableReader::new(file, Local::now().naive_local());

    let mut loaded = 0usize;
    for receivable in reader.receivables() {
        let result = match receivable {
            Ok(receivable) => service.load_receivable(receivable).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => loaded += 1,
            Err(e) => warn!("Skipping receivable from {}: {}", path.display(), e),
        }
    }
    info!("Loaded {} receivables from {}", loaded, path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(cli.log_level.into())
        .with_utc_timestamps()
        .init()
        .into_diagnostic()?;

    let (receivables, payments) = open_stores(cli.db_path)?;
    let service = PaymentService::new(receivables, payments)
        .with_overpayment_policy(cli.overpayment.into());

    if let Some(path) = cli.receivables {
        load_receivables(&service, path).await?;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    Console::new(&service, stdin.lock(), stdout.lock())
        .run()
        .await
        .into_diagnostic()?;

    service.shutdown().await.into_diagnostic()?;
    Ok(())
}
