//! Subprocess dispatcher: runs one worker invocation per call.
//!
//! Each call spawns an isolated, single-shot child with the configured
//! program, `[script, ...args]` as its argv, stdin closed, stdout captured
//! and stderr appended to the diagnostic log. The call waits for the child
//! up to the configured timeout; past that the child is killed and the
//! result is `{"status": 408}`.
//!
//! There is no shared mutable state between calls. Concurrent requests get
//! independent children.

use async_trait::async_trait;
use std::fs::OpenOptions;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

use super::command::{Operation, WorkerCommand};
use super::result::{WorkerProtocolError, WorkerResult};
use super::ChainWorker;
use crate::config::{DispatcherConfig, ScriptSpec};
use crate::metrics::PipelineMetrics;

/// Why an invocation produced no usable result line.
#[derive(Debug, Error)]
enum DispatchError {
    #[error("failed to spawn worker: {0}")]
    Spawn(std::io::Error),

    #[error("failed waiting for worker: {0}")]
    Wait(std::io::Error),

    #[error("worker exceeded {0:?} and was killed")]
    Timeout(Duration),

    #[error(transparent)]
    Protocol(#[from] WorkerProtocolError),
}

/// Production [`ChainWorker`]: one child process per dispatch.
pub struct ProcessDispatcher {
    config: DispatcherConfig,
    metrics: Arc<PipelineMetrics>,
}

impl ProcessDispatcher {
    pub fn new(config: DispatcherConfig, metrics: Arc<PipelineMetrics>) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn script_for(&self, operation: &Operation) -> &ScriptSpec {
        match *operation {
            Operation::Transaction { kind, phase } => {
                self.config.scripts.for_operation(kind, phase)
            }
            Operation::Info => &self.config.scripts.info,
        }
    }

    /// Opens the append-only diagnostic log as the child's stderr.
    ///
    /// A log we cannot open must not cost the user their transaction, so
    /// this falls back to discarding stderr.
    fn log_sink(&self) -> Stdio {
        let path = self.config.log_path();
        if let Err(e) = std::fs::create_dir_all(&self.config.log_dir) {
            tracing::warn!(path = %path.display(), error = %e, "cannot create worker log directory");
            return Stdio::null();
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Stdio::from(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot open worker log");
                Stdio::null()
            }
        }
    }

    async fn run(&self, command: &WorkerCommand) -> Result<WorkerResult, DispatchError> {
        let spec = self.script_for(&command.operation);
        let program = self.config.program_for(spec);

        let mut cmd = Command::new(program);
        cmd.arg(&spec.script)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(self.log_sink())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(DispatchError::Spawn)?;

        // Dropping the wait future on timeout drops the child, and
        // `kill_on_drop` takes it down with it.
        let timeout = self.config.timeout();
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| DispatchError::Timeout(timeout))?
            .map_err(DispatchError::Wait)?;

        if !output.status.success() {
            tracing::debug!(status = %output.status, "worker exited unsuccessfully");
        }

        Ok(WorkerResult::from_stdout(&output.stdout)?)
    }
}

#[async_trait]
impl ChainWorker for ProcessDispatcher {
    async fn dispatch(&self, command: WorkerCommand) -> WorkerResult {
        let label = command.operation.label();
        let started = Instant::now();
        self.metrics.record_invocation(&label);

        let result = match self.run(&command).await {
            Ok(result) => result,
            Err(DispatchError::Timeout(limit)) => {
                tracing::error!(operation = %label, limit_secs = limit.as_secs(), "worker timed out");
                self.metrics.worker_timeouts_total.inc();
                WorkerResult::timeout()
            }
            Err(e) => {
                tracing::error!(operation = %label, error = %e, "worker invocation failed");
                WorkerResult::failure()
            }
        };

        let elapsed = started.elapsed();
        self.metrics
            .worker_latency_seconds
            .observe(elapsed.as_secs_f64());
        if !result.is_ok() {
            self.metrics.record_worker_failure(&label);
        }

        tracing::info!(
            operation = %label,
            status = result.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "worker returned"
        );
        result
    }
}
