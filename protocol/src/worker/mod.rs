//! # Chain Worker Boundary
//!
//! Building, merging and submitting transactions needs a chain index, coin
//! selection and the reward token's policy scripts. None of that lives in
//! this crate. It is delegated to an external worker process behind a
//! narrow contract:
//!
//! ```text
//!   argv:   [script, field, field, ...]        (one field per entry, never a shell string)
//!   stdout: exactly one JSON line              {"status": 200, "txId": "..."}
//!   stderr: free-form diagnostics              appended to <log_dir>/<subsystem>.log
//! ```
//!
//! Exit codes carry no meaning. Success or failure is read from the stdout
//! line alone, and a line that does not parse is a generic failure (500).
//!
//! [`ChainWorker`] is the seam. [`ProcessDispatcher`] is the production
//! implementation; tests substitute a scripted fake.

pub mod command;
pub mod dispatcher;
pub mod result;

use async_trait::async_trait;
use std::sync::Arc;

pub use command::{Operation, WorkerCommand};
pub use dispatcher::ProcessDispatcher;
pub use result::{WorkerProtocolError, WorkerResult};

/// Anything that can carry out a worker invocation.
///
/// Implementations must never fail outward: every problem, including their
/// own, is reported as a [`WorkerResult`] with a non-200 status.
#[async_trait]
pub trait ChainWorker: Send + Sync {
    /// Runs `command` to completion and returns its result line.
    async fn dispatch(&self, command: WorkerCommand) -> WorkerResult;
}

#[async_trait]
impl<T: ChainWorker + ?Sized> ChainWorker for Arc<T> {
    async fn dispatch(&self, command: WorkerCommand) -> WorkerResult {
        (**self).dispatch(command).await
    }
}
