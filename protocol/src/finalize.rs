//! # Worker-Side Merge and Submit
//!
//! The Rust half of the merge+submit worker contract. Given the wallet's
//! witness set and the unsigned transaction (both hex), it:
//!
//! 1. decodes both,
//! 2. verifies every offered signature against the body hash,
//! 3. attaches the new vkey witnesses without touching the body or any
//!    other witness entry,
//! 4. submits the signed bytes through a [`ChainSubmitter`].
//!
//! The entry points return a [`WorkerResult`] rather than a `Result`: the
//! binary prints it as its one stdout line, and the only failure status it
//! ever emits is 500. Details go to the log, never to stdout.

use thiserror::Error;

use crate::cbor::{CborError, Transaction, WitnessError, WitnessSet};
use crate::chain::{ChainSubmitter, SubmitError};
use crate::worker::WorkerResult;

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("{field} is not valid hex: {source}")]
    Hex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("unreadable witness set: {0}")]
    WitnessSet(#[source] WitnessError),

    #[error("unreadable transaction: {0}")]
    Transaction(#[source] WitnessError),

    #[error("witness set carries no vkey signatures")]
    NoSignatures,

    #[error("merge rejected: {0}")]
    Merge(#[source] WitnessError),

    #[error(transparent)]
    Encode(#[from] CborError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, FinalizeError> {
    hex::decode(value.trim()).map_err(|source| FinalizeError::Hex { field, source })
}

/// Attaches the signatures in `witness_hex` to the transaction in `tx_hex`.
///
/// Attaching is idempotent: signatures already present are skipped.
pub fn merge_witness(witness_hex: &str, tx_hex: &str) -> Result<Transaction, FinalizeError> {
    let witness_bytes = decode_hex("witness set", witness_hex)?;
    let tx_bytes = decode_hex("transaction", tx_hex)?;

    let witnesses = WitnessSet::from_cbor(&witness_bytes).map_err(FinalizeError::WitnessSet)?;
    if witnesses.vkeys().is_empty() {
        return Err(FinalizeError::NoSignatures);
    }
    let mut tx = Transaction::from_cbor(&tx_bytes).map_err(FinalizeError::Transaction)?;

    let added = tx.add_signatures(&witnesses).map_err(FinalizeError::Merge)?;
    tracing::debug!(
        tx_id = %tx.id(),
        offered = witnesses.vkeys().len(),
        added,
        "witnesses merged"
    );
    Ok(tx)
}

/// Merges, then submits. Returns the id the network accepted.
pub async fn submit_signed<S>(
    submitter: &S,
    witness_hex: &str,
    tx_hex: &str,
) -> Result<String, FinalizeError>
where
    S: ChainSubmitter + ?Sized,
{
    let tx = merge_witness(witness_hex, tx_hex)?;
    let bytes = tx.to_cbor()?;
    let local_id = tx.id();

    let tx_id = submitter.submit(&bytes).await?;
    if !tx_id.eq_ignore_ascii_case(&local_id) {
        tracing::warn!(%local_id, network_id = %tx_id, "network reported a different transaction id");
    }
    Ok(tx_id)
}

/// `submit-tx`: `{status: 200, txId}` on success, `{status: 500}` otherwise.
pub async fn finalize_and_submit<S>(submitter: &S, witness_hex: &str, tx_hex: &str) -> WorkerResult
where
    S: ChainSubmitter + ?Sized,
{
    match submit_signed(submitter, witness_hex, tx_hex).await {
        Ok(tx_id) => {
            tracing::info!(%tx_id, "transaction submitted");
            WorkerResult::submitted(tx_id)
        }
        Err(e) => {
            tracing::error!(error = %e, "submit-tx failed");
            WorkerResult::failure()
        }
    }
}

/// `merge-tx`: `{status: 200, cborTx}` with the signed transaction, no submit.
pub fn finalize_merge_only(witness_hex: &str, tx_hex: &str) -> WorkerResult {
    let merged =
        merge_witness(witness_hex, tx_hex).and_then(|tx| tx.to_cbor().map_err(FinalizeError::from));
    match merged {
        Ok(bytes) => WorkerResult::built(hex::encode(bytes)),
        Err(e) => {
            tracing::error!(error = %e, "merge-tx failed");
            WorkerResult::failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ed25519_dalek::{Signer, SigningKey};
    use parking_lot::Mutex;
    use rand::rngs::OsRng;

    // [{0: [], 2: 200000}, {}, true, null]
    const UNSIGNED_HEX: &str = "84a20080021a00030d40a0f5f6";

    /// Records what it was asked to submit and answers with the body hash.
    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: Mutex<Vec<Vec<u8>>>,
        reject: bool,
    }

    #[async_trait]
    impl ChainSubmitter for RecordingSubmitter {
        async fn submit(&self, tx_cbor: &[u8]) -> Result<String, SubmitError> {
            self.submitted.lock().push(tx_cbor.to_vec());
            if self.reject {
                return Err(SubmitError::Rejected {
                    status: 400,
                    body: "BadInputsUTxO".into(),
                });
            }
            let tx = Transaction::from_cbor(tx_cbor)
                .map_err(|e| SubmitError::ParseResponse(e.to_string()))?;
            Ok(tx.id())
        }
    }

    fn signed_witness_hex(key: &SigningKey) -> String {
        let tx = Transaction::from_hex(UNSIGNED_HEX).unwrap();
        let mut bytes = vec![0xa1, 0x00, 0x81, 0x82, 0x58, 0x20];
        bytes.extend_from_slice(key.verifying_key().as_bytes());
        bytes.extend_from_slice(&[0x58, 0x40]);
        bytes.extend_from_slice(&key.sign(&tx.hash()).to_bytes());
        hex::encode(bytes)
    }

    #[tokio::test]
    async fn submits_merged_transaction() {
        let key = SigningKey::generate(&mut OsRng);
        let submitter = RecordingSubmitter::default();
        let expected_id = Transaction::from_hex(UNSIGNED_HEX).unwrap().id();

        let result = finalize_and_submit(&submitter, &signed_witness_hex(&key), UNSIGNED_HEX).await;
        assert_eq!(result, WorkerResult::submitted(expected_id));

        let sent = submitter.submitted.lock();
        let tx = Transaction::from_cbor(&sent[0]).unwrap();
        assert_eq!(tx.witness_set().vkeys().len(), 1);
        assert_eq!(tx.witness_set().vkeys()[0].vkey, key.verifying_key().to_bytes());
    }

    #[tokio::test]
    async fn network_rejection_is_500() {
        let key = SigningKey::generate(&mut OsRng);
        let submitter = RecordingSubmitter {
            reject: true,
            ..Default::default()
        };
        let result = finalize_and_submit(&submitter, &signed_witness_hex(&key), UNSIGNED_HEX).await;
        assert_eq!(result, WorkerResult::failure());
    }

    #[tokio::test]
    async fn forged_signature_never_reaches_network() {
        let key = SigningKey::generate(&mut OsRng);
        let mut witness = hex::decode(signed_witness_hex(&key)).unwrap();
        let last = witness.len() - 1;
        witness[last] ^= 0x01;

        let submitter = RecordingSubmitter::default();
        let result = finalize_and_submit(&submitter, &hex::encode(witness), UNSIGNED_HEX).await;
        assert_eq!(result.status, 500);
        assert!(submitter.submitted.lock().is_empty());
    }

    #[test]
    fn merge_is_idempotent() {
        let key = SigningKey::generate(&mut OsRng);
        let witness = signed_witness_hex(&key);

        let once = merge_witness(&witness, UNSIGNED_HEX).unwrap().to_cbor().unwrap();
        let twice = merge_witness(&witness, &hex::encode(&once))
            .unwrap()
            .to_cbor()
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_witness_set_is_rejected() {
        assert!(matches!(
            merge_witness("a0", UNSIGNED_HEX),
            Err(FinalizeError::NoSignatures)
        ));
    }

    #[test]
    fn bad_hex_names_the_field() {
        let err = merge_witness("a0", "xyz").unwrap_err();
        assert!(err.to_string().starts_with("transaction is not valid hex"));
    }

    #[test]
    fn merge_only_returns_signed_cbor() {
        let key = SigningKey::generate(&mut OsRng);
        let result = finalize_merge_only(&signed_witness_hex(&key), UNSIGNED_HEX);
        assert!(result.is_ok());
        let tx = Transaction::from_hex(result.artifact().unwrap()).unwrap();
        assert_eq!(tx.id(), Transaction::from_hex(UNSIGNED_HEX).unwrap().id());
    }
}
