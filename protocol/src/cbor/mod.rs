//! # Transaction CBOR
//!
//! Just enough Cardano transaction CBOR to attach a wallet's signatures to
//! an unsigned transaction without disturbing anything else.
//!
//! - [`raw`]: span scanner; locates items without decoding them.
//! - [`witness`]: witness set map; decodes only the vkey witnesses.
//! - [`tx`]: the `[body, witness_set, ...]` envelope and the transaction id.

pub mod raw;
pub mod tx;
pub mod witness;

pub use raw::CborError;
pub use tx::{Transaction, TxHexError};
pub use witness::{VkeyWitness, WitnessError, WitnessSet};
