//! Error taxonomy for the finalization pipeline.
//!
//! Every way a request can fail is a [`PipelineError`], and every
//! `PipelineError` becomes exactly one [`ExternalStatus`]. Local failures
//! (validation, authorization, guards) keep their specific message. Worker
//! failures go through the translation table, so internal codes and worker
//! text never leak.

use thiserror::Error;

use crate::config::EXTERNAL_STATUS_FAILURE;
use crate::transaction::authorization::Unauthorized;
use crate::transaction::types::{Phase, TransactionKind};
use crate::transaction::validation::ValidationError;
use crate::translate::{translate_status, ExternalStatus};

/// Errors that can end a build or submit request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or out-of-range request, caught before the worker.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The capability does not cover the requested kind.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] Unauthorized),

    /// The worker's output broke the result contract.
    #[error("worker protocol violation: {0}")]
    WorkerProtocol(String),

    /// The worker refused to build, with a (possibly kind-specific) status.
    #[error("{kind} build failed with worker status {worker_status}")]
    DomainBuildFailure {
        kind: TransactionKind,
        worker_status: i64,
    },

    /// Merge or network submission failed.
    #[error("submission failed with worker status {worker_status}")]
    SubmissionFailure { worker_status: i64 },

    /// Another build for the same requestor and kind is still running.
    #[error("a {kind} build is already in flight for {requestor}")]
    BuildInProgress {
        requestor: String,
        kind: TransactionKind,
    },

    /// The artifact was already submitted (or is being submitted right now).
    #[error("artifact was already submitted")]
    StaleArtifact,
}

impl PipelineError {
    /// The status the web tier sees for this error.
    pub fn external(&self) -> ExternalStatus {
        match self {
            Self::Validation(e) => ExternalStatus::new(EXTERNAL_STATUS_FAILURE, e.to_string()),
            Self::Unauthorized(e) => ExternalStatus::new(EXTERNAL_STATUS_FAILURE, e.to_string()),
            Self::WorkerProtocol(_) => ExternalStatus::generic_failure(),
            Self::DomainBuildFailure {
                kind,
                worker_status,
            } => translate_status(*kind, Phase::Build, *worker_status),
            Self::SubmissionFailure { worker_status } => {
                // Any kind works here: the submit table has no domain entries.
                translate_status(TransactionKind::Mint, Phase::MergeSubmit, *worker_status)
            }
            Self::BuildInProgress { .. } => ExternalStatus::new(
                EXTERNAL_STATUS_FAILURE,
                "A transaction is already being built for this user",
            ),
            Self::StaleArtifact => ExternalStatus::new(
                EXTERNAL_STATUS_FAILURE,
                "Transaction has already been submitted",
            ),
        }
    }

    /// Short label for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::WorkerProtocol(_) => "worker_protocol",
            Self::DomainBuildFailure { .. } => "build_failure",
            Self::SubmissionFailure { .. } => "submission_failure",
            Self::BuildInProgress { .. } => "build_in_progress",
            Self::StaleArtifact => "stale_artifact",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_keeps_its_message() {
        let err = PipelineError::from(ValidationError::BelowMinimumAda { quantity: 1 });
        assert_eq!(
            err.external(),
            ExternalStatus::new(400, "Minimum 2 Ada donation is required")
        );
    }

    #[test]
    fn unauthorized_is_distinct_from_validation() {
        let err = PipelineError::from(Unauthorized {
            requestor: "u".into(),
            kind: TransactionKind::MerchantMint,
        });
        assert_eq!(err.external().msg, "User must be an admin");
        assert_eq!(err.reason(), "unauthorized");
    }

    #[test]
    fn worker_detail_never_leaks() {
        let err = PipelineError::WorkerProtocol("SyntaxError at line 3 of build.mjs".into());
        assert_eq!(err.external(), ExternalStatus::generic_failure());
    }

    #[test]
    fn domain_failure_goes_through_table() {
        let err = PipelineError::DomainBuildFailure {
            kind: TransactionKind::Burn,
            worker_status: 501,
        };
        assert_eq!(
            err.external(),
            ExternalStatus::new(401, "Insufficient Littercoin In Wallet For Burn")
        );
    }

    #[test]
    fn submission_failure_is_generic() {
        let err = PipelineError::SubmissionFailure { worker_status: 501 };
        assert_eq!(err.external(), ExternalStatus::generic_failure());
    }
}
