//! Argument vectors for worker invocations.
//!
//! Every field is its own argv entry. Nothing here ever builds a command
//! *string*, so a quote or `;` in an address is just a byte in an argument.
//! The only joined value is the UTXO set, which the worker splits on
//! [`UTXO_DELIMITER`](crate::config::UTXO_DELIMITER).

use crate::transaction::types::{
    Phase, TransactionKind, TransactionRequest, UnsignedTxHex, WitnessSetHex,
};

/// What the worker is being asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Transaction { kind: TransactionKind, phase: Phase },
    /// Read-only snapshot of contract state (Ada locked, Littercoin supply).
    Info,
}

impl Operation {
    pub fn build(kind: TransactionKind) -> Self {
        Self::Transaction {
            kind,
            phase: Phase::Build,
        }
    }

    pub fn merge_submit(kind: TransactionKind) -> Self {
        Self::Transaction {
            kind,
            phase: Phase::MergeSubmit,
        }
    }

    /// Metric/log label, e.g. `burn_build`.
    pub fn label(&self) -> String {
        match self {
            Self::Transaction { kind, phase } => format!("{}_{}", kind, phase),
            Self::Info => "info".to_string(),
        }
    }
}

/// A fully specified worker invocation, minus the script name (which the
/// dispatcher resolves from its configuration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub operation: Operation,
    pub args: Vec<String>,
}

impl WorkerCommand {
    /// Build-phase arguments for a validated request.
    ///
    /// | kind            | argv after the script                       |
    /// |-----------------|---------------------------------------------|
    /// | `Mint`          | quantity, destination, change, utxos        |
    /// | `Burn`          | quantity, change, utxos                     |
    /// | `MerchantMint`  | destination, change, utxos                  |
    /// | `TreasuryTopUp` | quantity, change, utxos                     |
    pub fn build(request: &TransactionRequest) -> Self {
        let quantity = request.quantity.unwrap_or_default().to_string();
        let dest = request.destination_address.clone();
        let change = request.change_address.clone();
        let utxos = request.utxos.to_argument();

        let args = match request.kind {
            TransactionKind::Mint => vec![quantity, dest, change, utxos],
            TransactionKind::Burn | TransactionKind::TreasuryTopUp => {
                vec![quantity, change, utxos]
            }
            TransactionKind::MerchantMint => vec![dest, change, utxos],
        };

        Self {
            operation: Operation::build(request.kind),
            args,
        }
    }

    /// Merge+submit arguments: the witness set first, then the artifact.
    pub fn merge_submit(
        kind: TransactionKind,
        witness: &WitnessSetHex,
        artifact: &UnsignedTxHex,
    ) -> Self {
        Self {
            operation: Operation::merge_submit(kind),
            args: vec![witness.to_string(), artifact.to_string()],
        }
    }

    pub fn info() -> Self {
        Self {
            operation: Operation::Info,
            args: Vec::new(),
        }
    }
}
