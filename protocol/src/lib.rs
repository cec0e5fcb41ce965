// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Littercoin Protocol: Transaction Finalization Pipeline
//!
//! Server-side orchestration for the Littercoin reward token on Cardano.
//! Users turn off-chain litter-picking rewards into on-chain tokens, redeem
//! them for Ada, and admins mint merchant tokens or top up the treasury.
//! Every one of those actions is a two-phase, client-signed transaction:
//!
//! 1. **Build.** The server asks a chain worker for an unsigned transaction
//!    and hands the hex artifact to the client.
//! 2. **Merge + submit.** The client signs it in a browser wallet and sends
//!    back a witness set; the worker attaches it and submits to the network.
//!
//! The server never holds user keys. Its job is to validate and authorize
//! requests, run the worker safely, and translate whatever the worker says
//! into a small set of stable client-facing statuses.
//!
//! ## Architecture
//!
//! - **transaction**: Request types, input validation, authorization.
//! - **worker**: The worker result contract and the subprocess dispatcher.
//! - **translate**: Worker status → external status tables.
//! - **orchestrator**: The build/submit entry points the web tier calls.
//! - **guard**: In-flight build and submission guards.
//! - **cbor**: Byte-preserving witness merge on transaction CBOR.
//! - **chain**: Network submission.
//! - **finalize**: The Rust merge+submit worker logic.
//! - **metrics**: Prometheus counters for all of the above.
//! - **config**: Status codes, limits, and dispatcher configuration.

pub mod cbor;
pub mod chain;
pub mod config;
pub mod error;
pub mod finalize;
pub mod guard;
pub mod metrics;
pub mod orchestrator;
pub mod transaction;
pub mod translate;
pub mod worker;

pub use config::DispatcherConfig;
pub use error::PipelineError;
pub use metrics::PipelineMetrics;
pub use orchestrator::Orchestrator;
pub use transaction::{
    Capability, Role, TransactionKind, TransactionRequest, TxId, UnsignedTxHex, UtxoSet,
    WitnessSetHex,
};
pub use translate::ExternalStatus;
pub use worker::{ChainWorker, ProcessDispatcher, WorkerCommand, WorkerResult};
