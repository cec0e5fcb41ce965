// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Littercoin Chain Worker
//!
//! Entry point for the `littercoin-worker` binary: the merge+submit side of
//! the chain worker contract, runnable directly by the dispatcher.
//!
//! The binary supports three subcommands:
//!
//! - `submit-tx`: merge the witness set and submit; prints `{status, txId}`
//! - `merge-tx`: merge only; prints `{status, cborTx}`
//! - `version`: print build version information
//!
//! Whatever happens, `submit-tx` and `merge-tx` print exactly one JSON line
//! on stdout. Failures are `{"status":500}` with the details in the log.
//! A malformed command line prints that same line before exiting non-zero.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use littercoin_protocol::chain::BlockfrostSubmitter;
use littercoin_protocol::finalize::{finalize_and_submit, finalize_merge_only};
use littercoin_protocol::WorkerResult;

use cli::{Commands, LittercoinWorkerCli, TxArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match LittercoinWorkerCli::try_parse() {
        Ok(cli) => cli,
        // `--help` and `--version` print to stdout and exit 0.
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            emit(&WorkerResult::failure())?;
            std::process::exit(e.exit_code());
        }
    };
    logging::init_logging(
        "littercoin_worker=info,littercoin_protocol=info",
        cli.log_format,
    );

    let result = match cli.command {
        Commands::SubmitTx(args) => submit_tx(&cli.submit_url, cli.project_id, args).await,
        Commands::MergeTx(args) => finalize_merge_only(&args.witness_hex, &args.tx_hex),
        Commands::Version => {
            print_version();
            return Ok(());
        }
    };
    emit(&result)
}

async fn submit_tx(submit_url: &str, project_id: Option<String>, args: TxArgs) -> WorkerResult {
    tracing::info!(submit_url, "submit-tx started");
    match BlockfrostSubmitter::new(submit_url, project_id) {
        Ok(submitter) => finalize_and_submit(&submitter, &args.witness_hex, &args.tx_hex).await,
        Err(e) => {
            tracing::error!(error = %e, "failed to create submit client");
            WorkerResult::failure()
        }
    }
}

/// Writes the single result line to stdout.
fn emit(result: &WorkerResult) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", result.to_json_line()).context("failed to write result line")?;
    stdout.flush().context("failed to flush stdout")
}

fn print_version() {
    println!("littercoin-worker {}", env!("CARGO_PKG_VERSION"));
    println!("rustc             {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
