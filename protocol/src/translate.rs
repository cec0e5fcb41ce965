//! Worker status → external status translation.
//!
//! Worker statuses are an internal namespace: they depend on whichever
//! worker scripts are deployed and must never reach a user. Each kind has a
//! fixed table from worker status to a stable `{status, msg}` pair. Anything
//! not in the table, including timeouts and protocol violations, becomes
//! `400 "Transaction could not be submitted"`.
//!
//! | kind            | worker | external | message                                            |
//! |-----------------|--------|----------|----------------------------------------------------|
//! | `Burn`          | 501    | 401      | Insufficient Littercoin In Wallet For Burn         |
//! | `Burn`          | 502    | 402      | Merchant Token Not Found                           |
//! | `Burn`          | 503    | 403      | Ada Withdraw amount is less than the minimum 2 Ada |
//! | `Burn`          | 504    | 404      | Insufficient funds in Littercoin contract          |
//! | `TreasuryTopUp` | 501    | 401      | Not enough Ada in Wallet                           |
//!
//! Domain codes only exist for the build phase. Merge+submit has no
//! domain-specific failures.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{
    EXTERNAL_STATUS_FAILURE, EXTERNAL_STATUS_OK, MSG_TX_NOT_SUBMITTED,
    WORKER_STATUS_BELOW_MIN_ADA, WORKER_STATUS_INSUFFICIENT_BALANCE,
    WORKER_STATUS_INSUFFICIENT_CONTRACT_FUNDS, WORKER_STATUS_OK, WORKER_STATUS_TOKEN_NOT_FOUND,
};
use crate::error::PipelineError;
use crate::transaction::types::{is_transport_hex, Phase, TransactionKind};
use crate::worker::WorkerResult;

/// The stable status handed to the web tier, serialized as
/// `{"status": 401, "msg": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalStatus {
    pub status: u16,
    pub msg: String,
}

impl ExternalStatus {
    pub fn new(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(EXTERNAL_STATUS_OK, "OK")
    }

    /// `400 "Transaction could not be submitted"`.
    pub fn generic_failure() -> Self {
        Self::new(EXTERNAL_STATUS_FAILURE, MSG_TX_NOT_SUBMITTED)
    }

    pub fn is_ok(&self) -> bool {
        self.status == EXTERNAL_STATUS_OK
    }
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.msg)
    }
}

/// Domain-specific entry of a kind's build table, if there is one.
fn domain_entry(kind: TransactionKind, worker_status: i64) -> Option<(u16, &'static str)> {
    match (kind, worker_status) {
        (TransactionKind::Burn, WORKER_STATUS_INSUFFICIENT_BALANCE) => {
            Some((401, "Insufficient Littercoin In Wallet For Burn"))
        }
        (TransactionKind::Burn, WORKER_STATUS_TOKEN_NOT_FOUND) => {
            Some((402, "Merchant Token Not Found"))
        }
        (TransactionKind::Burn, WORKER_STATUS_BELOW_MIN_ADA) => {
            Some((403, "Ada Withdraw amount is less than the minimum 2 Ada"))
        }
        (TransactionKind::Burn, WORKER_STATUS_INSUFFICIENT_CONTRACT_FUNDS) => {
            Some((404, "Insufficient funds in Littercoin contract"))
        }
        (TransactionKind::TreasuryTopUp, WORKER_STATUS_INSUFFICIENT_BALANCE) => {
            Some((401, "Not enough Ada in Wallet"))
        }
        _ => None,
    }
}

/// Maps a worker status to its external status for `(kind, phase)`.
pub fn translate_status(kind: TransactionKind, phase: Phase, worker_status: i64) -> ExternalStatus {
    if worker_status == WORKER_STATUS_OK {
        return ExternalStatus::ok();
    }
    match phase {
        Phase::Build => domain_entry(kind, worker_status)
            .map(|(status, msg)| ExternalStatus::new(status, msg))
            .unwrap_or_else(ExternalStatus::generic_failure),
        Phase::MergeSubmit => ExternalStatus::generic_failure(),
    }
}

/// The table lookup for a whole result.
pub fn translate(kind: TransactionKind, phase: Phase, result: &WorkerResult) -> ExternalStatus {
    translate_status(kind, phase, result.status)
}

/// Classifies a worker result for the orchestrator.
///
/// A 200 must carry what its phase promises (a hex artifact for build, a
/// transaction id for merge+submit); a 200 without it is a protocol
/// violation. Every other status becomes the phase's failure variant.
pub fn interpret(
    kind: TransactionKind,
    phase: Phase,
    result: WorkerResult,
) -> Result<WorkerResult, PipelineError> {
    if !result.is_ok() {
        return Err(match phase {
            Phase::Build => PipelineError::DomainBuildFailure {
                kind,
                worker_status: result.status,
            },
            Phase::MergeSubmit => PipelineError::SubmissionFailure {
                worker_status: result.status,
            },
        });
    }

    match phase {
        Phase::Build => match result.artifact() {
            Some(hex) if is_transport_hex(hex) => Ok(result),
            Some(_) => Err(PipelineError::WorkerProtocol(
                "build artifact is not hex".into(),
            )),
            None => Err(PipelineError::WorkerProtocol(
                "build succeeded without an artifact".into(),
            )),
        },
        Phase::MergeSubmit => match result.tx_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(result),
            _ => Err(PipelineError::WorkerProtocol(
                "submit succeeded without a txId".into(),
            )),
        },
    }
}
