//! Network submission.
//!
//! The merge produces signed transaction bytes; a [`ChainSubmitter`] hands
//! them to the network and reports the transaction id it was accepted under.

pub mod blockfrost;

use async_trait::async_trait;
use thiserror::Error;

pub use blockfrost::BlockfrostSubmitter;

/// Errors from submitting a signed transaction.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submit request failed: {0}")]
    Request(String),

    #[error("submit rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unreadable submit response: {0}")]
    ParseResponse(String),
}

/// Anything that can put a signed transaction on chain.
#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    /// Submits CBOR-encoded transaction bytes and returns the transaction id.
    async fn submit(&self, tx_cbor: &[u8]) -> Result<String, SubmitError>;
}
