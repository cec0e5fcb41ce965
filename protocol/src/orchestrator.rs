//! # Transaction Request Orchestrator
//!
//! The only component the web tier talks to. It composes authorization,
//! validation, the in-flight guards, the worker and the status translator
//! into two operations per kind:
//!
//! ```text
//! request_build(capability, request)          → Ok(unsigned tx hex) | Err(ExternalStatus)
//! request_submit(capability, kind, witness, tx) → Ok(txId)         | Err(ExternalStatus)
//! ```
//!
//! Between the two calls the client signs the artifact in its wallet. The
//! orchestrator keeps nothing about the request in between: the artifact is
//! round-tripped by the caller. Nothing is retried. After any failure the
//! caller starts over from a fresh build with a fresh UTXO set, because the
//! wallet may already consider the old inputs spent.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::guard::{BuildGuard, SubmissionGuard};
use crate::metrics::PipelineMetrics;
use crate::transaction::authorization::authorize;
use crate::transaction::types::{
    Capability, Phase, TransactionKind, TransactionRequest, TxId, UnsignedTxHex, WitnessSetHex,
};
use crate::transaction::validation::{validate, validate_submit};
use crate::translate::{interpret, ExternalStatus};
use crate::worker::{ChainWorker, WorkerCommand};

/// Composes the pipeline around a [`ChainWorker`].
pub struct Orchestrator<W> {
    worker: W,
    builds: BuildGuard,
    submissions: SubmissionGuard,
    metrics: Arc<PipelineMetrics>,
}

impl<W: ChainWorker> Orchestrator<W> {
    pub fn new(worker: W, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            worker,
            builds: BuildGuard::new(),
            submissions: SubmissionGuard::new(),
            metrics,
        }
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Builds the unsigned transaction for `request`.
    ///
    /// Authorization and validation run first; a request that fails either
    /// never reaches the worker.
    pub async fn request_build(
        &self,
        capability: &Capability,
        request: TransactionRequest,
    ) -> Result<UnsignedTxHex, ExternalStatus> {
        let span = tracing::info_span!(
            "build",
            request_id = %Uuid::new_v4(),
            kind = %request.kind,
            requestor = %capability.requestor,
        );
        self.build(capability, request)
            .instrument(span)
            .await
            .map_err(|e| self.reject(e))
    }

    /// Merges the client's witness set into `artifact` and submits it.
    pub async fn request_submit(
        &self,
        capability: &Capability,
        kind: TransactionKind,
        witness: WitnessSetHex,
        artifact: UnsignedTxHex,
    ) -> Result<TxId, ExternalStatus> {
        let span = tracing::info_span!(
            "submit",
            request_id = %Uuid::new_v4(),
            kind = %kind,
            requestor = %capability.requestor,
        );
        self.submit(capability, kind, witness, artifact)
            .instrument(span)
            .await
            .map_err(|e| self.reject(e))
    }

    /// Snapshot of contract state as reported by the worker's info script.
    pub async fn request_info(&self) -> Result<serde_json::Value, ExternalStatus> {
        let result = self.worker.dispatch(WorkerCommand::info()).await;
        if !result.is_ok() {
            return Err(self.reject(PipelineError::WorkerProtocol(format!(
                "info query returned status {}",
                result.status
            ))));
        }
        Ok(serde_json::Value::Object(result.extra))
    }

    async fn build(
        &self,
        capability: &Capability,
        request: TransactionRequest,
    ) -> Result<UnsignedTxHex, PipelineError> {
        let kind = request.kind;
        authorize(capability, kind)?;
        validate(&request)?;

        let _permit = self
            .builds
            .try_acquire(&capability.requestor, kind)
            .ok_or_else(|| PipelineError::BuildInProgress {
                requestor: capability.requestor.clone(),
                kind,
            })?;

        tracing::debug!(utxos = request.utxos.len(), "dispatching build");
        let result = self.worker.dispatch(WorkerCommand::build(&request)).await;
        let result = interpret(kind, Phase::Build, result)?;

        let artifact = result
            .artifact()
            .map(UnsignedTxHex::new)
            .ok_or_else(|| PipelineError::WorkerProtocol("artifact vanished".into()))?;
        tracing::info!(bytes = artifact.as_str().len() / 2, "transaction built");
        Ok(artifact)
    }

    async fn submit(
        &self,
        capability: &Capability,
        kind: TransactionKind,
        witness: WitnessSetHex,
        artifact: UnsignedTxHex,
    ) -> Result<TxId, PipelineError> {
        authorize(capability, kind)?;
        validate_submit(&witness, &artifact)?;

        let claim = self.submissions.claim(&artifact).map_err(|state| {
            tracing::warn!(?state, "artifact offered for submission again");
            PipelineError::StaleArtifact
        })?;

        let command = WorkerCommand::merge_submit(kind, &witness, &artifact);
        let result = self.worker.dispatch(command).await;
        let result = interpret(kind, Phase::MergeSubmit, result)?;

        let tx_id = result
            .tx_id
            .map(TxId::new)
            .ok_or_else(|| PipelineError::WorkerProtocol("txId vanished".into()))?;
        claim.commit(tx_id.clone());

        self.metrics.transactions_submitted_total.inc();
        tracing::info!(tx_id = %tx_id, "transaction submitted");
        Ok(tx_id)
    }

    fn reject(&self, error: PipelineError) -> ExternalStatus {
        self.metrics.record_rejection(error.reason());
        let external = error.external();
        match &error {
            PipelineError::Validation(_)
            | PipelineError::Unauthorized(_)
            | PipelineError::BuildInProgress { .. }
            | PipelineError::StaleArtifact => {
                tracing::info!(error = %error, status = external.status, "request rejected")
            }
            _ => tracing::warn!(error = %error, status = external.status, "request failed"),
        }
        external
    }
}
