// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing::{error, info};

use vanguard_rs_dispatcher::core::{catalog, validator};
use vanguard_rs_dispatcher::logging::initialize_logging;
use vanguard_rs_dispatcher::report::{FlashLevel, FlashMessage, record_line};
use vanguard_rs_dispatcher::{DispatcherConfig, HttpTaskClient, JsonlRecordStore, Orchestrator, RecordStore};

#[derive(Debug, Parser)]
#[command(version, about = "Run network diagnostics through a remote task API and keep their history.")]
struct Cli {
    /// Override the task API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit one or more operations against a target and wait for them.
    Run {
        /// Owner of the resulting records.
        #[arg(long)]
        user: String,
        /// Domain or IP address; a scheme or path is stripped.
        #[arg(long)]
        target: String,
        /// Operation to run (ping, port_scan, dns_lookup, http_headers). Repeatable.
        #[arg(long = "operation", short = 'o', required = true, value_delimiter = ',')]
        operations: Vec<String>,
        /// Ports for port_scan, comma separated.
        #[arg(long)]
        ports: Option<String>,
        /// Operations allowed in flight at once.
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Show a user's past records, newest first.
    History {
        #[arg(long)]
        user: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the available operations.
    Operations,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let log_path = initialize_logging()?;
    let cli = Cli::parse();
    info!(log = %log_path.display(), "Dispatcher starting.");

    let mut config = DispatcherConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url)?;
    }

    match cli.command {
        Command::Operations => {
            for detail in catalog::all() {
                println!("{:<13} {:<13} {}", detail.operation, detail.title, detail.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::History { user, limit } => {
            let store = JsonlRecordStore::open(&config.history_path).await?;
            let history = store.history(&user).await?;
            if history.is_empty() {
                println!("No records for {}.", user);
            }
            for record in history.iter().take(limit.unwrap_or(usize::MAX)) {
                println!("{}", record_line(record));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { user, target, operations, ports, concurrency } => {
            if let Some(limit) = concurrency {
                config = config.with_max_concurrency(limit)?;
            }

            let requests = match validator::parse_operations(operations.as_slice()).and_then(|ops| {
                validator::validate_batch(&target, &ops, ports.as_deref(), &config.default_ports)
            }) {
                Ok(requests) => requests,
                Err(e) => {
                    error!(error = %e, "Submission rejected.");
                    eprintln!("{}", e);
                    return Ok(ExitCode::from(2));
                }
            };

            let client = Arc::new(HttpTaskClient::new(&config).wrap_err("could not set up the task client")?);
            let store = Arc::new(
                JsonlRecordStore::open(&config.history_path)
                    .await
                    .wrap_err_with(|| format!("could not open {}", config.history_path.display()))?,
            );
            let orchestrator = Orchestrator::new(client, store, &config);

            let batch = orchestrator.run_batch(&user, requests).await;
            for record in batch.records() {
                println!("{}", record_line(record));
            }
            let flash = FlashMessage::for_batch(&batch);
            println!("{}", flash);

            Ok(match flash.level {
                FlashLevel::Success => ExitCode::SUCCESS,
                FlashLevel::Warning | FlashLevel::Error => ExitCode::FAILURE,
            })
        }
    }
}
