//! # Transaction Requests
//!
//! Everything the pipeline knows about a transaction before the worker sees
//! it: what kind it is, who is asking, and whether the request is acceptable.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        : TransactionKind, Phase, TransactionRequest, Capability, opaque blobs
//! validation.rs   : Per-kind precondition checks (quantity, UTXOs, addresses, hex)
//! authorization.rs: Capability gate for administrator-only kinds
//! ```
//!
//! ## Request Lifecycle
//!
//! ```text
//! Requested → Validated → Authorized → Built(artifact)
//!           → AwaitingClientSignature → Submitted(txId) | Failed(code)
//! ```
//!
//! Validation and authorization are local and cheap. They always run before
//! a subprocess is spawned, so a rejected request costs nothing at the
//! worker boundary and never shows up in the worker's log.

pub mod authorization;
pub mod types;
pub mod validation;

pub use authorization::{authorize, Unauthorized};
pub use types::{
    Capability, Phase, Role, TransactionKind, TransactionRequest, TxId, UnsignedTxHex, UtxoRef,
    UtxoSet, WitnessSetHex,
};
pub use validation::{validate, validate_submit, ValidationError};
