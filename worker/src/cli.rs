//! # CLI Interface
//!
//! Defines the command-line argument structure for `littercoin-worker`
//! using `clap` derive. The dispatcher invokes it as
//! `littercoin-worker submit-tx <witnessHex> <artifactHex>`; the network
//! settings come from the environment so the argv stays exactly the
//! contract's two fields.

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

/// Default submit endpoint (Blockfrost, preprod network).
pub const DEFAULT_SUBMIT_URL: &str = "https://cardano-preprod.blockfrost.io/api/v0";

/// Littercoin chain worker.
///
/// Attaches a wallet's witness set to an unsigned transaction and submits
/// it. Prints exactly one JSON line on stdout; diagnostics go to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "littercoin-worker",
    about = "Littercoin merge+submit chain worker",
    version,
    propagate_version = true
)]
pub struct LittercoinWorkerCli {
    /// Base URL of a Blockfrost-compatible API.
    #[arg(long, global = true, env = "LITTERCOIN_SUBMIT_URL", default_value = DEFAULT_SUBMIT_URL)]
    pub submit_url: String,

    /// Blockfrost project id, sent as the `project_id` header.
    ///
    /// Leave unset for self-hosted submit APIs.
    #[arg(long, global = true, env = "LITTERCOIN_PROJECT_ID", hide_env_values = true)]
    pub project_id: Option<String>,

    /// Log format for stderr.
    #[arg(
        long,
        global = true,
        env = "LITTERCOIN_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge the witness set into the transaction and submit it.
    SubmitTx(TxArgs),
    /// Merge only; print the signed transaction instead of submitting.
    MergeTx(TxArgs),
    /// Print version information and exit.
    Version,
}

/// The two contract fields, in contract order.
#[derive(Args, Debug)]
pub struct TxArgs {
    /// Hex CBOR witness set returned by the wallet.
    pub witness_hex: String,

    /// Hex CBOR unsigned transaction from the build phase.
    pub tx_hex: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        LittercoinWorkerCli::command().debug_assert();
    }

    #[test]
    fn contract_argv_parses() {
        let cli = LittercoinWorkerCli::try_parse_from([
            "littercoin-worker",
            "submit-tx",
            "a100",
            "84a400",
        ])
        .unwrap();
        match cli.command {
            Commands::SubmitTx(args) => {
                assert_eq!(args.witness_hex, "a100");
                assert_eq!(args.tx_hex, "84a400");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_an_error() {
        assert!(LittercoinWorkerCli::try_parse_from(["littercoin-worker", "submit-tx", "a100"])
            .is_err());
    }

    #[test]
    fn log_format_flag() {
        let cli = LittercoinWorkerCli::try_parse_from([
            "littercoin-worker",
            "merge-tx",
            "a1",
            "84",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
