use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::backend::{fetch_record, AdapterTable, BackendsConfig};
use crate::bench;
use crate::models::{parse_phrases, BackendId, ComparisonReport, SearchPhrase};
use crate::report;
use crate::search::Dispatcher;

mod args;
mod config;
mod format;

pub use args::{Cli, Commands, CompareArgs, ConnectionArgs, GetArgs, OutputFormat, SearchArgs};

use config::{
    apply_compare_config_defaults, apply_get_config_defaults, apply_search_config_defaults,
    backends_config, load_cli_config, CliConfig,
};

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }

            let request = args::search_request_from_args(&search_args)?;
            let backends = connection_config(&search_args.connection, cli_config.as_ref());

            // Only the selected backend is wired up, after its identifier
            // has been validated.
            let backend: BackendId = request.backend.parse()?;
            let result = block_on(async {
                let dispatcher = Dispatcher::new(AdapterTable::for_backend(backend, &backends)?);
                dispatcher.dispatch_to(backend, request.phrase).await
            })??;

            match search_args.format {
                OutputFormat::Table => format::print_result_table(&report::result_view(&result)),
                OutputFormat::Json => format::print_json(&result),
            }
        }
        Some(Commands::Compare(mut compare_args)) => {
            if let Some(ref config) = cli_config {
                apply_compare_config_defaults(config, &mut compare_args);
            }

            let plan = args::compare_plan_from_args(&compare_args)?;
            let phrases = read_phrases(&plan.file)?;
            let backends = connection_config(&compare_args.connection, cli_config.as_ref());

            let comparison = block_on(async {
                let dispatcher = Dispatcher::new(AdapterTable::from_config(&backends)?)
                    .with_timeout(plan.timeout);
                bench::compare(&dispatcher, phrases, plan.options).await
            })??;

            if let Some(out) = &compare_args.out {
                write_report(out, &comparison)?;
            }

            match compare_args.format {
                OutputFormat::Table => {
                    format::print_comparison_table(&report::comparison_view(&comparison))
                }
                OutputFormat::Json => format::print_json(&comparison),
            }
        }
        Some(Commands::Get(mut get_args)) => {
            if let Some(ref config) = cli_config {
                apply_get_config_defaults(config, &mut get_args);
            }

            let request = args::get_request_from_args(&get_args)?;
            let backends = connection_config(&get_args.connection, cli_config.as_ref());

            let record = block_on(fetch_record(request.backend, &backends, &request.id))??;
            format::print_record(&request.id, record.as_ref())
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn connection_config(args: &ConnectionArgs, config: Option<&CliConfig>) -> BackendsConfig {
    args::backends_config_from_args(args, backends_config(config))
}

/// Run `future` to completion on a fresh single-threaded runtime.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

fn read_phrases(path: &Path) -> Result<Vec<SearchPhrase>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read phrase file at {}", path.display()))?;
    Ok(parse_phrases(&contents))
}

fn write_report(path: &Path, comparison: &ComparisonReport) -> Result<()> {
    let json = serde_json::to_string_pretty(comparison)?;
    fs::write(path, json + "\n")
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "comparison report written");
    Ok(())
}

/// Send log events to stderr so stdout stays machine-readable.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "dualsearch=warn",
        1 => "dualsearch=info",
        _ => "dualsearch=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
