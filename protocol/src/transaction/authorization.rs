//! Capability checks for administrator-gated transaction kinds.
//!
//! The gate is evaluated before any subprocess exists. It only looks at the
//! [`Capability`] it is handed; there is no ambient session to consult.

use thiserror::Error;

use super::types::{Capability, TransactionKind};

/// The capability does not grant the requested operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User must be an admin")]
pub struct Unauthorized {
    pub requestor: String,
    pub kind: TransactionKind,
}

/// Authorizes `capability` for a transaction of `kind`.
///
/// `MerchantMint` requires `admin` or `superadmin`. Every other kind passes
/// for any authenticated identity, which is what holding a capability means.
pub fn authorize(capability: &Capability, kind: TransactionKind) -> Result<(), Unauthorized> {
    if kind.requires_admin() && !capability.is_admin() {
        return Err(Unauthorized {
            requestor: capability.requestor.clone(),
            kind,
        });
    }
    Ok(())
}
