//! Request validation: stateless precondition checks per transaction kind.
//!
//! Everything here runs before the worker boundary. A request that fails
//! [`validate`] is never turned into a subprocess invocation. The checks
//! are pure functions of their input.

use thiserror::Error;

use super::types::{
    is_transport_hex, TransactionKind, TransactionRequest, UnsignedTxHex, WitnessSetHex,
};
use crate::config::MIN_TOP_UP_ADA;

/// Reasons a request is rejected before dispatch.
///
/// The `Display` text of each variant is the exact user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Mint or Burn with a quantity of zero, a negative quantity, or none.
    #[error("{}", non_positive_message(.kind))]
    NonPositiveQuantity { kind: TransactionKind },

    /// Treasury top-up under the minimum-ada floor.
    #[error("Minimum 2 Ada donation is required")]
    BelowMinimumAda { quantity: i64 },

    /// The client wallet offered no UTXOs to spend.
    #[error("At least one UTXO is required")]
    EmptyUtxoSet,

    /// Destination or change address missing or blank.
    #[error("Destination and change address are required")]
    MissingAddress,

    /// A submit-phase blob is not transport hex.
    #[error("Malformed {field}: expected a hex-encoded CBOR string")]
    MalformedHex { field: &'static str },
}

fn non_positive_message(kind: &TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Mint => "Littercoin due must be greater than zero",
        _ => "Littercoin amount must be greater than zero",
    }
}

/// Checks a build request against the per-kind preconditions.
///
/// The order is: quantity, UTXO set, addresses. The first failing check
/// wins.
pub fn validate(request: &TransactionRequest) -> Result<(), ValidationError> {
    match request.kind {
        TransactionKind::Mint | TransactionKind::Burn => {
            if request.quantity.unwrap_or(0) <= 0 {
                return Err(ValidationError::NonPositiveQuantity { kind: request.kind });
            }
        }
        TransactionKind::TreasuryTopUp => {
            let quantity = request.quantity.unwrap_or(0);
            if quantity < MIN_TOP_UP_ADA {
                return Err(ValidationError::BelowMinimumAda { quantity });
            }
        }
        TransactionKind::MerchantMint => {}
    }

    if request.utxos.is_empty() {
        return Err(ValidationError::EmptyUtxoSet);
    }

    if request.destination_address.trim().is_empty() || request.change_address.trim().is_empty()
    {
        return Err(ValidationError::MissingAddress);
    }

    Ok(())
}

/// Checks the two opaque blobs of a submit request are well-formed hex.
pub fn validate_submit(
    witness: &WitnessSetHex,
    artifact: &UnsignedTxHex,
) -> Result<(), ValidationError> {
    if !is_transport_hex(witness.as_str()) {
        return Err(ValidationError::MalformedHex {
            field: "witness set",
        });
    }
    if !is_transport_hex(artifact.as_str()) {
        return Err(ValidationError::MalformedHex {
            field: "transaction",
        });
    }
    Ok(())
}
