//! # Pipeline Configuration & Constants
//!
//! Every status number and default path the pipeline relies on lives here.
//! The worker status space (200, 500, 501–504, 408) and the external status
//! space (200, 400–404) are separate namespaces. Never compare a
//! worker status against an external constant.
//!
//! [`DispatcherConfig`] is the only runtime-tunable piece. It deserializes
//! from whatever the host uses (JSON, TOML) and defaults to the layout the
//! web tier has always used: Node scripts in `../littercoin`, diagnostics in
//! `../storage/logs/littercoin.log`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transaction::types::{Phase, TransactionKind};

// ---------------------------------------------------------------------------
// Worker Status Codes
// ---------------------------------------------------------------------------

/// The worker accepted the request. Build: `cborTx` carries the artifact.
/// Submit: `txId` carries the network transaction id.
pub const WORKER_STATUS_OK: i64 = 200;

/// Generic worker failure. Also what the dispatcher reports for protocol
/// violations (unparsable stdout, no stdout, spawn failure).
pub const WORKER_STATUS_FAILURE: i64 = 500;

/// Domain build failure: the wallet does not hold enough tokens or Ada.
pub const WORKER_STATUS_INSUFFICIENT_BALANCE: i64 = 501;

/// Domain build failure: a required on-chain token (merchant token) is missing.
pub const WORKER_STATUS_TOKEN_NOT_FOUND: i64 = 502;

/// Domain build failure: an output would fall below the minimum-ada floor.
pub const WORKER_STATUS_BELOW_MIN_ADA: i64 = 503;

/// Domain build failure: the Littercoin contract cannot cover the withdrawal.
pub const WORKER_STATUS_INSUFFICIENT_CONTRACT_FUNDS: i64 = 504;

/// Synthesized by the dispatcher when the worker exceeds its time budget.
/// Outside 501–504, so every table maps it to the generic failure.
pub const WORKER_STATUS_TIMEOUT: i64 = 408;

// ---------------------------------------------------------------------------
// External Status Codes
// ---------------------------------------------------------------------------

/// Success, returned alongside an artifact or a transaction id.
pub const EXTERNAL_STATUS_OK: u16 = 200;

/// Generic client-facing failure: validation, authorization, and every
/// worker failure without a domain-specific mapping.
pub const EXTERNAL_STATUS_FAILURE: u16 = 400;

/// Generic failure message for anything the worker could not complete.
pub const MSG_TX_NOT_SUBMITTED: &str = "Transaction could not be submitted";

// ---------------------------------------------------------------------------
// Request Limits
// ---------------------------------------------------------------------------

/// Minimum treasury top-up, in whole Ada. Below this the top-up output
/// would not satisfy the ledger's minimum-ada rule.
pub const MIN_TOP_UP_ADA: i64 = 2;

/// Separator used to serialize a UTXO set into a single worker argument.
pub const UTXO_DELIMITER: &str = ",";

/// How long a submitted artifact stays blocked from resubmission. Built
/// transactions expire on chain well before this.
pub const SUBMISSION_RETENTION_SECS: u64 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Dispatcher Defaults
// ---------------------------------------------------------------------------

/// Interpreter used for the build scripts.
pub const DEFAULT_WORKER_PROGRAM: &str = "node";

/// Directory the worker scripts live in, relative to the host's cwd.
pub const DEFAULT_WORKER_DIR: &str = "../littercoin";

/// Directory for the append-only diagnostic logs.
pub const DEFAULT_LOG_DIR: &str = "../storage/logs";

/// Subsystem name; the worker's stderr lands in `<log_dir>/<subsystem>.log`.
pub const DEFAULT_LOG_SUBSYSTEM: &str = "littercoin";

/// Upper bound on a single worker invocation. Building a transaction queries
/// the chain index a handful of times; two minutes is far beyond a healthy run.
pub const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Script Mapping
// ---------------------------------------------------------------------------

/// One worker entry point: the script (or subcommand) passed as `argv[1]`,
/// optionally run by a different program than the dispatcher default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSpec {
    /// Overrides [`DispatcherConfig::program`] for this entry point.
    #[serde(default)]
    pub program: Option<PathBuf>,
    /// Script name or subcommand, always the first argument.
    pub script: String,
}

impl ScriptSpec {
    /// A script run by the dispatcher's default program.
    pub fn script(name: impl Into<String>) -> Self {
        Self {
            program: None,
            script: name.into(),
        }
    }

    /// A subcommand of a dedicated executable (e.g. `littercoin-worker`).
    pub fn with_program(program: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
            script: name.into(),
        }
    }
}

/// Worker entry points for every operation the pipeline dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSet {
    pub mint_build: ScriptSpec,
    pub burn_build: ScriptSpec,
    pub merchant_mint_build: ScriptSpec,
    pub treasury_top_up_build: ScriptSpec,
    /// Merge+submit is kind-independent; one entry serves every kind.
    pub submit: ScriptSpec,
    pub info: ScriptSpec,
}

impl Default for ScriptSet {
    fn default() -> Self {
        Self {
            mint_build: ScriptSpec::script("build-lc-mint-tx.mjs"),
            burn_build: ScriptSpec::script("build-lc-burn-tx.mjs"),
            merchant_mint_build: ScriptSpec::script("build-merch-mint-tx.mjs"),
            treasury_top_up_build: ScriptSpec::script("build-add-ada-tx.mjs"),
            submit: ScriptSpec::script("submit-tx.mjs"),
            info: ScriptSpec::script("get-lc-info.mjs"),
        }
    }
}

impl ScriptSet {
    /// Resolves the entry point for a transaction operation.
    pub fn for_operation(&self, kind: TransactionKind, phase: Phase) -> &ScriptSpec {
        match (phase, kind) {
            (Phase::Build, TransactionKind::Mint) => &self.mint_build,
            (Phase::Build, TransactionKind::Burn) => &self.burn_build,
            (Phase::Build, TransactionKind::MerchantMint) => &self.merchant_mint_build,
            (Phase::Build, TransactionKind::TreasuryTopUp) => &self.treasury_top_up_build,
            (Phase::MergeSubmit, _) => &self.submit,
        }
    }
}

// ---------------------------------------------------------------------------
// DispatcherConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for the subprocess dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Default executable for every entry point without its own program.
    pub program: PathBuf,
    /// Working directory for the worker. `None` inherits the host's cwd.
    pub working_dir: Option<PathBuf>,
    /// Directory holding the append-only diagnostic logs.
    pub log_dir: PathBuf,
    /// Log file stem; diagnostics go to `<log_dir>/<log_subsystem>.log`.
    pub log_subsystem: String,
    /// Bounded wait per invocation, in seconds.
    pub timeout_secs: u64,
    pub scripts: ScriptSet,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_WORKER_PROGRAM),
            working_dir: Some(PathBuf::from(DEFAULT_WORKER_DIR)),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_subsystem: DEFAULT_LOG_SUBSYSTEM.to_string(),
            timeout_secs: DEFAULT_WORKER_TIMEOUT_SECS,
            scripts: ScriptSet::default(),
        }
    }
}

impl DispatcherConfig {
    /// Full path of the diagnostic log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.log", self.log_subsystem))
    }

    /// The per-invocation time budget.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Executable for an entry point, falling back to the default program.
    pub fn program_for<'a>(&'a self, spec: &'a ScriptSpec) -> &'a Path {
        spec.program.as_deref().unwrap_or(&self.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_domain_codes_are_contiguous() {
        assert_eq!(WORKER_STATUS_INSUFFICIENT_BALANCE, 501);
        assert_eq!(WORKER_STATUS_TOKEN_NOT_FOUND, 502);
        assert_eq!(WORKER_STATUS_BELOW_MIN_ADA, 503);
        assert_eq!(WORKER_STATUS_INSUFFICIENT_CONTRACT_FUNDS, 504);
    }

    #[test]
    fn timeout_status_is_outside_domain_range() {
        assert!(!(501..=504).contains(&WORKER_STATUS_TIMEOUT));
        assert_ne!(WORKER_STATUS_TIMEOUT, WORKER_STATUS_OK);
    }

    #[test]
    fn default_log_path_is_keyed_by_subsystem() {
        let cfg = DispatcherConfig::default();
        assert_eq!(
            cfg.log_path(),
            PathBuf::from("../storage/logs/littercoin.log")
        );
    }

    #[test]
    fn scripts_resolve_per_operation() {
        let scripts = ScriptSet::default();
        assert_eq!(
            scripts
                .for_operation(TransactionKind::Burn, Phase::Build)
                .script,
            "build-lc-burn-tx.mjs"
        );
        // Every kind shares the merge+submit entry point.
        for kind in TransactionKind::ALL {
            assert_eq!(
                scripts.for_operation(kind, Phase::MergeSubmit).script,
                "submit-tx.mjs"
            );
        }
    }

    #[test]
    fn program_override_wins() {
        let cfg = DispatcherConfig::default();
        let spec = ScriptSpec::with_program("/usr/local/bin/littercoin-worker", "submit-tx");
        assert_eq!(
            cfg.program_for(&spec),
            Path::new("/usr/local/bin/littercoin-worker")
        );
        assert_eq!(
            cfg.program_for(&ScriptSpec::script("x.mjs")),
            Path::new("node")
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: DispatcherConfig =
            serde_json::from_str(r#"{ "timeout_secs": 5, "log_subsystem": "lc" }"#).unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.log_path(), PathBuf::from("../storage/logs/lc.log"));
        assert_eq!(cfg.program, PathBuf::from("node"));
        assert_eq!(cfg.scripts, ScriptSet::default());
    }
}
