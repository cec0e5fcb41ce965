//! Core type definitions for Littercoin transaction requests.
//!
//! These types are the vocabulary shared by the validator, the authorization
//! gate, the dispatcher and the orchestrator. Chain data (UTXO references,
//! unsigned transactions, witness sets) stays opaque at this layer: it is
//! carried as strings and only ever decoded by the worker.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::UTXO_DELIMITER;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// The four transaction flows the pipeline knows how to finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Mint the Littercoin a user has earned but not yet been paid.
    Mint,
    /// Burn Littercoin in exchange for Ada from the contract.
    Burn,
    /// Mint a merchant token. Administrator-only.
    MerchantMint,
    /// Donate Ada to the Littercoin treasury ("add Ada").
    TreasuryTopUp,
}

impl TransactionKind {
    /// Every kind, in a stable order. Handy for table-driven tests.
    pub const ALL: [TransactionKind; 4] = [
        Self::Mint,
        Self::Burn,
        Self::MerchantMint,
        Self::TreasuryTopUp,
    ];

    /// Stable lowercase label used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::MerchantMint => "merchant_mint",
            Self::TreasuryTopUp => "treasury_top_up",
        }
    }

    /// Whether the kind mints or spends administrator-gated assets.
    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::MerchantMint)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Which half of the two-step flow a worker invocation serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Construct the unsigned transaction.
    Build,
    /// Merge the client's witness set into the artifact and submit it.
    MergeSubmit,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::MergeSubmit => "merge_submit",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UTXO references
// ---------------------------------------------------------------------------

/// A spendable output chosen by the client wallet (`<tx hash>#<index>` or
/// whatever encoding the wallet emits). Never decoded here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtxoRef(String);

impl UtxoRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ordered set of UTXO references, forwarded to the worker as one argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtxoSet(Vec<UtxoRef>);

impl UtxoSet {
    pub fn new(utxos: Vec<UtxoRef>) -> Self {
        Self(utxos)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UtxoRef> {
        self.0.iter()
    }

    /// Serializes the set as the single delimiter-joined worker argument.
    pub fn to_argument(&self) -> String {
        self.0
            .iter()
            .map(UtxoRef::as_str)
            .collect::<Vec<_>>()
            .join(UTXO_DELIMITER)
    }
}

impl<S: Into<String>> FromIterator<S> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| UtxoRef::new(s)).collect())
    }
}

// ---------------------------------------------------------------------------
// Opaque transport blobs
// ---------------------------------------------------------------------------

/// Hex-encoded CBOR of an unsigned transaction, as produced by the build
/// phase. The caller round-trips it untouched to the submit phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsignedTxHex(String);

/// Hex-encoded CBOR witness set produced by the client's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WitnessSetHex(String);

/// Network transaction id returned after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

macro_rules! string_newtype {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }

                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

string_newtype!(UnsignedTxHex, WitnessSetHex, TxId);

/// Returns `true` if `s` is a non-empty, even-length hex string. This is a
/// transport check only; the bytes are never interpreted here.
pub fn is_transport_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Roles the authentication tier can vouch for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

/// Explicit proof of who is asking and what they may do.
///
/// Issued by the (external) authentication tier for each inbound call and
/// passed into every orchestrator operation. Nothing in this crate reads
/// session or role state from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Stable identity of the authenticated requestor.
    pub requestor: String,
    pub roles: Vec<Role>,
}

impl Capability {
    /// An authenticated identity with no elevated roles.
    pub fn authenticated(requestor: impl Into<String>) -> Self {
        Self {
            requestor: requestor.into(),
            roles: vec![Role::User],
        }
    }

    /// Adds a role to the capability.
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin) || self.has_role(Role::Superadmin)
    }
}

// ---------------------------------------------------------------------------
// TransactionRequest
// ---------------------------------------------------------------------------

/// A build request for one transaction, constructed per inbound call.
///
/// `quantity` is kind-dependent: Littercoin count for `Mint`/`Burn`, whole
/// Ada for `TreasuryTopUp`, unused for `MerchantMint`. It is signed so that
/// non-positive inputs from the web tier reach the validator intact instead
/// of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub destination_address: String,
    #[serde(default)]
    pub change_address: String,
    #[serde(default)]
    pub utxos: UtxoSet,
}

impl TransactionRequest {
    /// Starts an empty request of the given kind.
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            quantity: None,
            destination_address: String::new(),
            change_address: String::new(),
            utxos: UtxoSet::default(),
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn destination(mut self, address: impl Into<String>) -> Self {
        self.destination_address = address.into();
        self
    }

    pub fn change(mut self, address: impl Into<String>) -> Self {
        self.change_address = address.into();
        self
    }

    pub fn utxos(mut self, utxos: UtxoSet) -> Self {
        self.utxos = utxos;
        self
    }
}
