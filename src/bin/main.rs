//! Command line interface to the transaction store
//!
//! Each subcommand performs exactly one repository or reconciliation
//! operation against the configured Redis database.
use anyhow::Context;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use log::{error, info};
use std::path::{Path, PathBuf};

use transaction_store::ingest::{self, CsvKind, CsvOptions, DEFAULT_CUTOFF};
use transaction_store::reconciliation::{self, ReconciliationEngine, ReconciliationRule};
use transaction_store::{
    PaymentRequestRepository, Record, RedisStore, StoreConfig, TransactionRepository,
    TransactionStatus, DEFAULT_PROVIDER,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage transaction records in Redis and reconcile them against exports")]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct ConnectionArgs {
    /// Redis server host
    #[arg(long, env = "REDIS_HOST", default_value = "localhost", global = true)]
    host: String,

    /// Redis server port
    #[arg(long, env = "REDIS_PORT", default_value_t = 6379, global = true)]
    port: u16,

    /// Redis database number
    #[arg(long, env = "REDIS_DB", default_value_t = 5, global = true)]
    db: i64,
}

impl From<&ConnectionArgs> for StoreConfig {
    fn from(args: &ConnectionArgs) -> Self {
        StoreConfig::new(args.host.clone(), args.port, args.db)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a transaction under a fresh identifier
    Create {
        /// Transaction amount
        #[arg(short, long)]
        amount: BigDecimal,

        /// Owner of the transaction
        #[arg(short, long)]
        user_id: String,

        /// Initial status, `pending` when omitted
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Set the status of an existing transaction
    Update {
        /// Transaction identifier, with or without the `transaction:` prefix
        id: String,

        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Show a single transaction
    Get {
        /// Transaction identifier, with or without the `transaction:` prefix
        id: String,
    },

    /// List the keys of all transactions
    List,

    /// Delete every transaction
    DeleteAll,

    /// Work with payment requests of a provider
    Requests(RequestsArgs),

    /// Compare stored payment requests against CSV and text exports
    Reconcile(ReconcileArgs),
}

#[derive(ClapArgs, Debug)]
struct RequestsArgs {
    /// Payment provider segment of the key prefix
    #[arg(long, default_value = DEFAULT_PROVIDER)]
    provider: String,

    #[command(subcommand)]
    command: RequestCommands,
}

#[derive(Subcommand, Debug)]
enum RequestCommands {
    /// List the keys of all requests
    List,

    /// Write the `key` field of every request to a file
    Export {
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Store fixture requests (for testing only)
    ///
    /// Identifiers come from the command line and, optionally, from the
    /// `OK` rows of a `transaction_id,obs` CSV export.
    Seed {
        /// Transaction identifiers
        ids: Vec<String>,

        /// `transaction_id,obs` CSV export to read identifiers from
        #[arg(long)]
        from_csv: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct ReconcileArgs {
    /// Payment provider segment of the key prefix
    #[arg(long, default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// CSV export to compare against
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Shape of the CSV export
    #[arg(long, value_enum, default_value_t = CsvKindArg::Key)]
    csv_kind: CsvKindArg,

    /// Plain-text list of identifiers, one per line
    #[arg(long)]
    text: Option<PathBuf>,

    /// Sources whose intersection selects stale requests
    #[arg(long, value_enum, default_value_t = RuleArg::StoreAndCsv)]
    rule: RuleArg,

    /// Keys dated on or after this day are kept (`key` exports only)
    #[arg(long, default_value_t = DEFAULT_CUTOFF)]
    cutoff: NaiveDate,

    /// Fail on unreadable exports instead of treating them as empty
    #[arg(long)]
    strict: bool,

    /// Delete the matched requests; without it the run only reports
    #[arg(long)]
    delete: bool,

    /// Record every deleted key in this file
    #[arg(long, requires = "delete")]
    deleted_log: Option<PathBuf>,

    /// Write the `key` field of every stored request to this file
    #[arg(long)]
    details_out: Option<PathBuf>,

    /// Write the identifiers loaded from the CSV export to this file
    #[arg(long)]
    csv_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl From<StatusArg> for TransactionStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => TransactionStatus::Pending,
            StatusArg::Completed => TransactionStatus::Completed,
            StatusArg::Failed => TransactionStatus::Failed,
            StatusArg::Cancelled => TransactionStatus::Cancelled,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CsvKindArg {
    /// `key,date` rows
    Key,
    /// `transaction_id,obs` rows
    TransactionId,
}

impl From<CsvKindArg> for CsvKind {
    fn from(kind: CsvKindArg) -> Self {
        match kind {
            CsvKindArg::Key => CsvKind::Key,
            CsvKindArg::TransactionId => CsvKind::TransactionId,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RuleArg {
    StoreAndCsv,
    StoreAndText,
}

impl From<RuleArg> for ReconciliationRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::StoreAndCsv => ReconciliationRule::StoreAndCsv,
            RuleArg::StoreAndText => ReconciliationRule::StoreAndText,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging with default level of "info"
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let config = StoreConfig::from(&args.connection);
    let store = RedisStore::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to redis at {}", config.url()))?;

    if let Err(e) = run(args.command, store).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, store: RedisStore) -> anyhow::Result<()> {
    match command {
        Commands::Create {
            amount,
            user_id,
            status,
        } => {
            let mut transactions = TransactionRepository::new(store);
            let record = transactions
                .create(amount, &user_id, status.map(Into::into))
                .await
                .context("Failed to create transaction")?;
            print_record(&record);
        }
        Commands::Update { id, status } => {
            let mut transactions = TransactionRepository::new(store);
            match transactions.update(&id, status.into()).await? {
                Some(record) => print_record(&record),
                None => println!("Transaction {id} not found"),
            }
        }
        Commands::Get { id } => {
            let transactions = TransactionRepository::new(store);
            match transactions.get(&id).await? {
                Some(record) => print_record(&record),
                None => println!("Transaction {id} not found"),
            }
        }
        Commands::List => {
            let transactions = TransactionRepository::new(store);
            for key in transactions.list().await? {
                println!("{key}");
            }
        }
        Commands::DeleteAll => {
            let mut transactions = TransactionRepository::new(store);
            let deleted = transactions.delete_all().await?;
            println!("Deleted {deleted} transactions");
        }
        Commands::Requests(requests) => run_requests(requests, store).await?,
        Commands::Reconcile(reconcile) => run_reconcile(reconcile, store).await?,
    }
    Ok(())
}

async fn run_requests(args: RequestsArgs, store: RedisStore) -> anyhow::Result<()> {
    let mut requests = PaymentRequestRepository::for_provider(store, &args.provider);

    match args.command {
        RequestCommands::List => {
            for key in requests.list().await? {
                println!("{key}");
            }
        }
        RequestCommands::Export { out } => {
            let keys = requests.list().await?;
            let records = requests.details(&keys).await?;
            let written = requests
                .export_keys(&records, &out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("{written} transaction keys have been written to {}", out.display());
        }
        RequestCommands::Seed { mut ids, from_csv } => {
            if let Some(path) = from_csv {
                let options = CsvOptions {
                    request_prefix: requests.prefix().to_string(),
                    ..CsvOptions::default()
                };
                ids.extend(
                    ingest::load_csv_path(&path, CsvKind::TransactionId, &options)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                );
            }
            let created = requests.seed(&ids).await?;
            println!("Created {created} fixture transactions");
        }
    }
    Ok(())
}

async fn run_reconcile(args: ReconcileArgs, store: RedisStore) -> anyhow::Result<()> {
    let mut requests = PaymentRequestRepository::for_provider(store, &args.provider);
    let options = CsvOptions {
        cutoff: args.cutoff,
        request_prefix: requests.prefix().to_string(),
    };

    println!("================= Get transactions from Redis =================");
    let store_ids = requests.list().await?;

    let csv_ids = match &args.csv {
        Some(path) => load_csv(path, args.csv_kind.into(), &options, args.strict)?,
        None => Vec::new(),
    };
    let text_ids = match &args.text {
        Some(path) => load_text(path, args.strict)?,
        None => Vec::new(),
    };
    println!("- {} identifiers loaded from CSV", csv_ids.len());
    println!("- {} identifiers loaded from text", text_ids.len());

    if let Some(path) = &args.details_out {
        let records = requests.details(&store_ids).await?;
        requests
            .export_keys(&records, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.csv_out {
        write_lines(path, &csv_ids)?;
    }

    let engine = ReconciliationEngine::new(store_ids, csv_ids, text_ids);
    let report = engine.reconcile(args.rule.into());

    println!("====================== {:?} ======================", report.rule);
    if report.is_empty() {
        println!("No matching transactions found for deletion.");
        return Ok(());
    }
    println!("- {} transactions to delete after intersection", report.matched.len());

    if !args.delete {
        info!("Dry run, pass --delete to remove the matched transactions");
        return Ok(());
    }

    let deleted =
        reconciliation::apply(&report, &mut requests, args.deleted_log.as_deref()).await?;
    println!("==> Deleted {deleted} transactions from Redis <==");
    Ok(())
}

fn load_csv(
    path: &Path,
    kind: CsvKind,
    options: &CsvOptions,
    strict: bool,
) -> anyhow::Result<Vec<String>> {
    if strict {
        ingest::load_csv_path(path, kind, options)
            .with_context(|| format!("Failed to read {}", path.display()))
    } else {
        Ok(ingest::load_csv_or_empty(path, kind, options))
    }
}

fn load_text(path: &Path, strict: bool) -> anyhow::Result<Vec<String>> {
    if strict {
        ingest::load_text_path(path).with_context(|| format!("Failed to read {}", path.display()))
    } else {
        Ok(ingest::load_text_or_empty(path))
    }
}

fn write_lines(path: &Path, lines: &[String]) -> anyhow::Result<()> {
    let mut contents = lines.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_record(record: &Record) {
    println!("{}", record.key);
    for (name, value) in &record.fields {
        match (name.as_str(), value.parse::<f64>()) {
            ("timestamp", Ok(timestamp)) => {
                let formatted = transaction_store::utils::format_timestamp(timestamp)
                    .unwrap_or_else(|| value.clone());
                println!("   {name}: {formatted}");
            }
            _ => println!("   {name}: {value}"),
        }
    }
}
